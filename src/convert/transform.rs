// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Transform nodes: placement changes on the converted child

use super::{boolean, context::Context, MirrorMode};
use crate::ast::{AstNode, ColorSpec};
use crate::csg::BooleanOp;
use crate::error::ConversionError;
use crate::scene::{Color, Mesh};
use crate::utils::math::{deg_to_rad, is_finite_vector};
use nalgebra::{Matrix3, Matrix4, Vector3};

pub(crate) fn apply(ctx: &Context<'_>, node: &AstNode) -> Result<Mesh, ConversionError> {
    let kind = node.kind();
    let mut mesh = child_mesh(ctx, kind, node.children())?;

    match node {
        AstNode::Translate { v, .. } => {
            mesh.transform.position = finite(kind, "v", v)?;
        }
        AstNode::Rotate { a, .. } => {
            let degrees = finite(kind, "a", a)?;
            mesh.transform.rotation = degrees.map(deg_to_rad);
        }
        AstNode::Scale { v, .. } => {
            mesh.transform.scale = finite(kind, "v", v)?;
        }
        AstNode::Mirror { v, .. } => {
            let normal = finite(kind, "v", v)?;
            mirror(&mut mesh, normal, ctx.config.mirror_mode)?;
        }
        AstNode::Multmatrix { m, .. } => {
            let matrix = affine_matrix(m)?;
            mesh.bake_transform();
            mesh.geometry.transform(&matrix);
        }
        AstNode::Color { c, alpha, .. } => {
            apply_color(&mut mesh, c, *alpha)?;
        }
        other => {
            return Err(ConversionError::invalid(
                other.kind(),
                "not a transform node",
            ));
        }
    }

    Ok(mesh)
}

/// The single child, or the implicit union of several
fn child_mesh(
    ctx: &Context<'_>,
    kind: &str,
    children: &[AstNode],
) -> Result<Mesh, ConversionError> {
    if children.is_empty() {
        return Err(ConversionError::missing_children(kind));
    }
    let meshes = ctx.convert_children(kind, children)?;
    if meshes.len() > 1 {
        log::debug!("{} has {} children, combining with union", kind, meshes.len());
    }
    boolean::fold(ctx, BooleanOp::Union, meshes)
}

fn finite(kind: &str, field: &str, value: &[f64; 3]) -> Result<Vector3<f64>, ConversionError> {
    let vector = Vector3::from(*value);
    if is_finite_vector(&vector) {
        Ok(vector)
    } else {
        Err(ConversionError::invalid(
            kind,
            format!("{} must be finite, got {:?}", field, value),
        ))
    }
}

fn mirror(mesh: &mut Mesh, normal: Vector3<f64>, mode: MirrorMode) -> Result<(), ConversionError> {
    match mode {
        MirrorMode::AxisFlip => {
            for axis in 0..3 {
                if normal[axis] != 0.0 {
                    mesh.transform.scale[axis] = -1.0;
                }
            }
        }
        MirrorMode::Reflection => {
            let Some(n) = normal.try_normalize(f64::EPSILON) else {
                return Err(ConversionError::invalid(
                    "mirror",
                    "normal vector must not be zero",
                ));
            };
            let reflection = Matrix3::identity() - 2.0 * n * n.transpose();
            mesh.bake_transform();
            mesh.geometry.transform(&reflection.to_homogeneous());
        }
    }
    Ok(())
}

/// 3 or 4 rows of 4 columns; an explicit last row must be `[0, 0, 0, 1]`
fn affine_matrix(rows: &[Vec<f64>]) -> Result<Matrix4<f64>, ConversionError> {
    let invalid = |reason: String| ConversionError::invalid("multmatrix", reason);

    if !(rows.len() == 3 || rows.len() == 4) || rows.iter().any(|row| row.len() != 4) {
        return Err(invalid("m must be a 3x4 or 4x4 matrix".to_string()));
    }
    if rows.iter().flatten().any(|c| !c.is_finite()) {
        return Err(invalid("m must be finite".to_string()));
    }
    if let Some(last) = rows.get(3) {
        if last.as_slice() != [0.0, 0.0, 0.0, 1.0] {
            return Err(invalid(format!(
                "last row must be [0, 0, 0, 1], got {:?}",
                last
            )));
        }
    }

    let mut matrix = Matrix4::identity();
    for (r, row) in rows.iter().take(3).enumerate() {
        for (c, value) in row.iter().enumerate() {
            matrix[(r, c)] = *value;
        }
    }
    Ok(matrix)
}

fn apply_color(
    mesh: &mut Mesh,
    spec: &ColorSpec,
    alpha: Option<f64>,
) -> Result<(), ConversionError> {
    let (color, component_alpha) = match spec {
        ColorSpec::Name(name) => (Color::parse(name)?, None),
        ColorSpec::Components(c) => {
            if !(c.len() == 3 || c.len() == 4) || c.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(ConversionError::invalid(
                    "color",
                    format!("c must have 3 or 4 components within [0, 1], got {:?}", c),
                ));
            }
            (Color::new(c[0], c[1], c[2]), c.get(3).copied())
        }
    };

    mesh.material.color = color;
    if let Some(opacity) = alpha.or(component_alpha) {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConversionError::invalid(
                "color",
                format!("alpha must be within [0, 1], got {}", opacity),
            ));
        }
        mesh.material.set_opacity(opacity);
    }
    Ok(())
}
