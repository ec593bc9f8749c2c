// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean composition of child meshes

use super::{context::Context, primitive};
use crate::ast::AstNode;
use crate::csg::BooleanOp;
use crate::error::ConversionError;
use crate::geometry::Geometry;
use crate::scene::Mesh;
use crate::utils::math::EPSILON;

/// Convert `children` and combine them with `op`.
///
/// No children yields a placeholder shape, one child passes through
/// untouched, more are folded left to right.
pub(crate) fn compose(
    ctx: &Context<'_>,
    op: BooleanOp,
    children: &[AstNode],
) -> Result<Mesh, ConversionError> {
    if children.is_empty() {
        log::debug!("{} without children, using placeholder", op);
        return Ok(primitive::placeholder(op, ctx.material()?));
    }

    let meshes = ctx.convert_children(op.name(), children)?;
    fold(ctx, op, meshes)
}

/// `op(op(m0, m1), m2)...` through the CSG provider
pub(crate) fn fold(
    ctx: &Context<'_>,
    op: BooleanOp,
    meshes: Vec<Mesh>,
) -> Result<Mesh, ConversionError> {
    let mut operands = meshes.into_iter();
    let Some(mut result) = operands.next() else {
        return Err(ConversionError::EmptyGeometry {
            kind: op.name().to_string(),
        });
    };
    // providers drop materials; the first operand's one is put back
    let material = result.material.clone();

    for (offset, mut operand) in operands.enumerate() {
        let step = offset + 1;
        ctx.token.check()?;

        let triangles = result.geometry.triangle_count() + operand.geometry.triangle_count();
        if triangles > ctx.config.max_complexity {
            return Err(ConversionError::ComplexityExceeded {
                op,
                step,
                triangles,
                limit: ctx.config.max_complexity,
            });
        }

        result.update_matrix_world();
        operand.update_matrix_world();
        log::debug!("{} step {}: {} triangles in", op, step, triangles);

        let mut geometry = ctx
            .provider
            .apply(op, &result, &operand)
            .map_err(|source| ConversionError::BooleanStep { op, step, source })?;
        if ctx.config.enable_optimization {
            optimize(&mut geometry);
        }

        result.dispose();
        operand.dispose();
        result = Mesh::new(geometry, material.clone());
    }

    Ok(result)
}

/// Drop degenerate faces and merge duplicate vertices
pub(crate) fn optimize(geometry: &mut Geometry) {
    let degenerate = geometry.remove_degenerate_triangles();
    let welded = geometry.weld_vertices(EPSILON);
    let orphaned = geometry.remove_orphaned_vertices();
    if degenerate + welded + orphaned > 0 {
        log::debug!(
            "optimized: -{} triangles, -{} welded, -{} orphaned vertices",
            degenerate,
            welded,
            orphaned
        );
    }
}
