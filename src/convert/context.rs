// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Synchronous tree walk shared by every entry point

use super::{boolean, primitive, transform, CancellationToken, ConversionConfig};
use crate::ast::AstNode;
use crate::csg::{BooleanOp, CsgProvider};
use crate::error::ConversionError;
use crate::scene::{Material, Mesh};

/// Everything a single conversion needs while walking the tree
pub(crate) struct Context<'a> {
    pub(crate) provider: &'a dyn CsgProvider,
    pub(crate) config: &'a ConversionConfig,
    pub(crate) token: &'a CancellationToken,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        provider: &'a dyn CsgProvider,
        config: &'a ConversionConfig,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            provider,
            config,
            token,
        }
    }

    /// A fresh material instance from the configured defaults
    pub(crate) fn material(&self) -> Result<Material, ConversionError> {
        Ok(Material::from_config(&self.config.material)?)
    }

    pub(crate) fn convert(&self, node: &AstNode) -> Result<Mesh, ConversionError> {
        self.token.check()?;
        log::debug!("converting {}", node.kind());
        let limit = self.config.max_complexity;

        match node {
            AstNode::Cube { size, center } => primitive::cube(*size, *center, self.material()?),
            AstNode::Sphere { r, fn_ } => primitive::sphere(*r, *fn_, limit, self.material()?),
            AstNode::Cylinder {
                h,
                r,
                r1,
                r2,
                center,
                fn_,
            } => primitive::cylinder(
                primitive::CylinderParams {
                    height: *h,
                    r: *r,
                    r1: *r1,
                    r2: *r2,
                    center: *center,
                    fn_: *fn_,
                },
                limit,
                self.material()?,
            ),
            AstNode::Polyhedron { points, faces } => {
                primitive::polyhedron(points, faces, limit, self.material()?)
            }
            AstNode::Circle { .. } | AstNode::Square { .. } | AstNode::Polygon { .. } => {
                Err(ConversionError::invalid(
                    node.kind(),
                    "2D shapes must be used inside linear_extrude or rotate_extrude",
                ))
            }
            AstNode::Translate { .. }
            | AstNode::Rotate { .. }
            | AstNode::Scale { .. }
            | AstNode::Mirror { .. }
            | AstNode::Multmatrix { .. }
            | AstNode::Color { .. } => transform::apply(self, node),
            AstNode::Union { children } => boolean::compose(self, BooleanOp::Union, children),
            AstNode::Intersection { children } => {
                boolean::compose(self, BooleanOp::Intersection, children)
            }
            AstNode::Difference { children } => {
                boolean::compose(self, BooleanOp::Difference, children)
            }
            AstNode::LinearExtrude {
                height,
                center,
                children,
            } => primitive::linear_extrude(self, *height, *center, children),
            AstNode::RotateExtrude {
                angle,
                fn_,
                children,
            } => primitive::rotate_extrude(self, *angle, *fn_, children),
            AstNode::Unsupported { kind } => Err(ConversionError::UnsupportedNode {
                kind: kind.clone(),
            }),
        }
    }

    /// Convert children in order, tagging failures with the child index
    pub(crate) fn convert_children(
        &self,
        kind: &str,
        children: &[AstNode],
    ) -> Result<Vec<Mesh>, ConversionError> {
        children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                self.convert(child)
                    .map_err(|error| error.in_child(kind, index))
            })
            .collect()
    }
}
