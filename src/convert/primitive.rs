// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Primitive nodes to meshes, with OpenSCAD placement.
//!
//! The scene is Y-up: cylinders stand on the Y axis. Extrusions keep
//! OpenSCAD's Z-up layout in their vertex data.

use super::{boolean, context::Context};
use crate::ast::{AstNode, Size2, Size3};
use crate::csg::BooleanOp;
use crate::error::ConversionError;
use crate::geometry::{self, Primitive, Profile, CYLINDER_RADIAL_SEGMENTS};
use crate::scene::{Material, Mesh};
use crate::utils::math::is_positive_finite;
use nalgebra::{Point2, Point3, Vector3};

const DEFAULT_CIRCLE_SEGMENTS: u32 = 32;

/// Fails when a tessellation would exceed `limit` triangles. Runs before
/// any buffer is allocated, so a huge `$fn` never reaches the allocator.
fn within_budget(
    kind: &str,
    triangles: Option<usize>,
    limit: usize,
) -> Result<(), ConversionError> {
    match triangles {
        Some(count) if count <= limit => Ok(()),
        Some(count) => Err(ConversionError::invalid(
            kind,
            format!("tessellation needs {} triangles, limit is {}", count, limit),
        )),
        None => Err(ConversionError::invalid(
            kind,
            format!("tessellation overflows the triangle count, limit is {}", limit),
        )),
    }
}

pub(crate) fn cube(size: Size3, center: bool, material: Material) -> Result<Mesh, ConversionError> {
    let size = size.to_vector();
    if !size.iter().all(|&s| is_positive_finite(s)) {
        return Err(ConversionError::invalid(
            "cube",
            format!(
                "size must be positive and finite, got [{}, {}, {}]",
                size.x, size.y, size.z
            ),
        ));
    }

    let geometry = Primitive::cuboid(size.x, size.y, size.z).to_geometry();
    let mut mesh = Mesh::new(geometry, material);
    if !center {
        mesh.transform.position = size / 2.0;
    }
    Ok(mesh)
}

pub(crate) fn sphere(
    radius: f64,
    fn_: Option<u32>,
    limit: usize,
    material: Material,
) -> Result<Mesh, ConversionError> {
    if !is_positive_finite(radius) {
        return Err(ConversionError::invalid(
            "sphere",
            format!("radius must be positive and finite, got {}", radius),
        ));
    }

    let primitive = match fn_.filter(|&n| n > 0) {
        Some(n) => Primitive::sphere_with_segments(radius, n, n / 2),
        None => Primitive::sphere(radius),
    };
    within_budget("sphere", primitive.triangle_count(), limit)?;
    Ok(Mesh::new(primitive.to_geometry(), material))
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CylinderParams {
    pub height: f64,
    pub r: Option<f64>,
    pub r1: Option<f64>,
    pub r2: Option<f64>,
    pub center: bool,
    pub fn_: Option<u32>,
}

pub(crate) fn cylinder(
    params: CylinderParams,
    limit: usize,
    material: Material,
) -> Result<Mesh, ConversionError> {
    let CylinderParams {
        height,
        r,
        r1,
        r2,
        center,
        fn_,
    } = params;
    // r1 is the bottom radius, r2 the top
    let bottom = r1.or(r).unwrap_or(1.0);
    let top = r2.or(r).unwrap_or(1.0);

    if !is_positive_finite(height) {
        return Err(ConversionError::invalid(
            "cylinder",
            format!("height must be positive and finite, got {}", height),
        ));
    }
    if !(top.is_finite() && bottom.is_finite()) || top < 0.0 || bottom < 0.0 {
        return Err(ConversionError::invalid(
            "cylinder",
            format!(
                "radii must be finite and non-negative, got r1={} r2={}",
                bottom, top
            ),
        ));
    }
    if top == 0.0 && bottom == 0.0 {
        return Err(ConversionError::invalid(
            "cylinder",
            "at least one radius must be positive",
        ));
    }

    let segments = fn_.filter(|&n| n > 0).unwrap_or(CYLINDER_RADIAL_SEGMENTS);
    let primitive = Primitive::cylinder_with_segments(top, bottom, height, segments);
    within_budget("cylinder", primitive.triangle_count(), limit)?;
    let mut mesh = Mesh::new(primitive.to_geometry(), material);
    if !center {
        mesh.transform.position = Vector3::new(0.0, height / 2.0, 0.0);
    }
    Ok(mesh)
}

pub(crate) fn polyhedron(
    points: &[[f64; 3]],
    faces: &[Vec<usize>],
    limit: usize,
    material: Material,
) -> Result<Mesh, ConversionError> {
    if points.len() < 4 || faces.len() < 4 {
        return Err(ConversionError::invalid(
            "polyhedron",
            "needs at least 4 points and 4 faces",
        ));
    }
    if points.iter().flatten().any(|c| !c.is_finite()) {
        return Err(ConversionError::invalid(
            "polyhedron",
            "points must be finite",
        ));
    }
    for (index, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(ConversionError::invalid(
                "polyhedron",
                format!("face {} has fewer than 3 points", index),
            ));
        }
        if let Some(bad) = face.iter().find(|&&i| i >= points.len()) {
            return Err(ConversionError::invalid(
                "polyhedron",
                format!("face {} references missing point {}", index, bad),
            ));
        }
    }

    let points = points.iter().map(|p| Point3::from(*p)).collect();
    let primitive = Primitive::polyhedron(points, faces.to_vec());
    within_budget("polyhedron", primitive.triangle_count(), limit)?;
    let geometry = primitive.to_geometry();
    if geometry.is_empty() {
        return Err(ConversionError::EmptyGeometry {
            kind: "polyhedron".into(),
        });
    }
    Ok(Mesh::new(geometry, material))
}

/// Outline of a 2D node. `limit` caps the outline's point count.
pub(crate) fn profile(node: &AstNode, limit: usize) -> Result<Profile, ConversionError> {
    let kind = node.kind();
    let invalid = |reason: &str| ConversionError::invalid(kind, reason);

    match node {
        AstNode::Circle { r, fn_ } => {
            if !is_positive_finite(*r) {
                return Err(invalid("radius must be positive and finite"));
            }
            let segments = fn_.filter(|&n| n > 0).unwrap_or(DEFAULT_CIRCLE_SEGMENTS);
            // every outline point costs at least one triangle once extruded
            within_budget(kind, usize::try_from(segments).ok(), limit)?;
            Profile::circle(*r, segments).ok_or_else(|| invalid("degenerate circle"))
        }
        AstNode::Square { size, center } => {
            let size = Size2::to_vector(*size);
            if !(is_positive_finite(size.x) && is_positive_finite(size.y)) {
                return Err(invalid("size must be positive and finite"));
            }
            Profile::rectangle(size.x, size.y, *center)
                .ok_or_else(|| invalid("degenerate square"))
        }
        AstNode::Polygon { points } => {
            let points = points.iter().map(|p| Point2::from(*p)).collect();
            Profile::from_points(points).ok_or_else(|| {
                invalid("needs at least 3 finite points enclosing an area without crossing itself")
            })
        }
        other => Err(ConversionError::invalid(
            other.kind(),
            "only circle, square and polygon can be extruded",
        )),
    }
}

fn profiles(
    ctx: &Context<'_>,
    kind: &str,
    children: &[AstNode],
) -> Result<Vec<Profile>, ConversionError> {
    if children.is_empty() {
        return Err(ConversionError::missing_children(kind));
    }
    let limit = ctx.config.max_complexity;
    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            profile(child, limit).map_err(|error| error.in_child(kind, index))
        })
        .collect()
}

/// Extrude every profile and union the solids
fn extrude_all(
    ctx: &Context<'_>,
    kind: &str,
    profiles: Vec<Profile>,
    count: impl Fn(&Profile) -> Option<usize>,
    build: impl Fn(&Profile) -> geometry::Geometry,
) -> Result<Mesh, ConversionError> {
    let mut meshes = Vec::with_capacity(profiles.len());
    for profile in &profiles {
        ctx.token.check()?;
        within_budget(kind, count(profile), ctx.config.max_complexity)?;
        meshes.push(Mesh::new(build(profile), ctx.material()?));
    }
    boolean::fold(ctx, BooleanOp::Union, meshes)
}

pub(crate) fn linear_extrude(
    ctx: &Context<'_>,
    height: f64,
    center: bool,
    children: &[AstNode],
) -> Result<Mesh, ConversionError> {
    if !is_positive_finite(height) {
        return Err(ConversionError::invalid(
            "linear_extrude",
            format!("height must be positive and finite, got {}", height),
        ));
    }
    let profiles = profiles(ctx, "linear_extrude", children)?;
    extrude_all(
        ctx,
        "linear_extrude",
        profiles,
        geometry::linear_extrude_triangle_count,
        |profile| geometry::linear_extrude(profile, height, center),
    )
}

pub(crate) fn rotate_extrude(
    ctx: &Context<'_>,
    angle: f64,
    fn_: Option<u32>,
    children: &[AstNode],
) -> Result<Mesh, ConversionError> {
    if !is_positive_finite(angle) {
        return Err(ConversionError::invalid(
            "rotate_extrude",
            format!("angle must be within (0, 360], got {}", angle),
        ));
    }
    let profiles = profiles(ctx, "rotate_extrude", children)?;
    if let Some(index) = profiles.iter().position(|p| p.min_x() < 0.0) {
        return Err(ConversionError::invalid(
            "rotate_extrude",
            format!("child {} crosses the rotation axis (negative x)", index),
        ));
    }

    let segments = fn_.filter(|&n| n > 0).unwrap_or(CYLINDER_RADIAL_SEGMENTS);
    let angle = angle.min(360.0);
    extrude_all(
        ctx,
        "rotate_extrude",
        profiles,
        |profile| geometry::rotate_extrude_triangle_count(profile, angle, segments),
        |profile| geometry::rotate_extrude(profile, angle, segments),
    )
}

/// Stand-in for a boolean node without children
pub(crate) fn placeholder(op: BooleanOp, material: Material) -> Mesh {
    let primitive = match op {
        BooleanOp::Union => Primitive::cuboid(1.0, 1.0, 1.0),
        BooleanOp::Intersection => Primitive::sphere(0.5),
        BooleanOp::Difference => Primitive::cylinder(0.5, 0.5, 1.0),
    };
    Mesh::new(primitive.to_geometry(), material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SPHERE_HEIGHT_SEGMENTS, SPHERE_WIDTH_SEGMENTS};
    use approx::assert_relative_eq;

    const LIMIT: usize = 50_000;

    fn params(height: f64, r: Option<f64>) -> CylinderParams {
        CylinderParams {
            height,
            r,
            r1: None,
            r2: None,
            center: false,
            fn_: None,
        }
    }

    #[test]
    fn test_cube_placement() {
        let mesh = cube(Size3::Vector([2.0, 4.0, 6.0]), false, Material::default()).unwrap();
        assert_eq!(mesh.transform.position, Vector3::new(1.0, 2.0, 3.0));

        let mesh = cube(Size3::Scalar(2.0), true, Material::default()).unwrap();
        assert_eq!(mesh.transform.position, Vector3::zeros());
    }

    #[test]
    fn test_cube_rejects_bad_sizes() {
        for size in [
            Size3::Scalar(0.0),
            Size3::Vector([1.0, -1.0, 1.0]),
            Size3::Scalar(f64::NAN),
        ] {
            let error = cube(size, false, Material::default()).unwrap_err();
            assert!(matches!(error, ConversionError::InvalidParameters { .. }));
        }
    }

    #[test]
    fn test_sphere_segments() {
        let default = sphere(1.0, None, LIMIT, Material::default()).unwrap();
        let expected =
            Primitive::sphere_with_segments(1.0, SPHERE_WIDTH_SEGMENTS, SPHERE_HEIGHT_SEGMENTS)
                .to_geometry();
        assert_eq!(default.geometry.triangle_count(), expected.triangle_count());

        let coarse = sphere(1.0, Some(8), LIMIT, Material::default()).unwrap();
        assert!(coarse.geometry.triangle_count() < default.geometry.triangle_count());
    }

    #[test]
    fn test_cylinder_sits_on_ground() {
        let mesh = cylinder(params(10.0, Some(2.0)), LIMIT, Material::default()).unwrap();
        assert_eq!(mesh.transform.position, Vector3::new(0.0, 5.0, 0.0));
        let bbox = mesh.geometry.bounding_box();
        assert_relative_eq!(bbox.min.y, -5.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cone_and_bad_radii() {
        let cone = CylinderParams {
            r1: Some(2.0),
            r2: Some(0.0),
            ..params(3.0, None)
        };
        assert!(cylinder(cone, LIMIT, Material::default()).is_ok());

        let flat = CylinderParams {
            r1: Some(0.0),
            r2: Some(0.0),
            ..params(3.0, None)
        };
        assert!(cylinder(flat, LIMIT, Material::default()).is_err());
        assert!(cylinder(params(-1.0, Some(1.0)), LIMIT, Material::default()).is_err());
    }

    #[test]
    fn test_polyhedron_validation() {
        let points = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 3, 1], vec![0, 2, 3], vec![1, 3, 2]];
        let mesh = polyhedron(&points, &faces, LIMIT, Material::default()).unwrap();
        assert_eq!(mesh.geometry.triangle_count(), 4);

        let broken = vec![vec![0, 1, 9], vec![0, 3, 1], vec![0, 2, 3], vec![1, 3, 2]];
        let error = polyhedron(&points, &broken, LIMIT, Material::default()).unwrap_err();
        assert!(error.to_string().contains("missing point 9"));
    }

    #[test]
    fn test_placeholders_differ_per_operator() {
        let ops = [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference];
        let counts: Vec<usize> = ops
            .into_iter()
            .map(|op| placeholder(op, Material::default()).geometry.triangle_count())
            .collect();
        assert_eq!(counts[0], 12);
        assert_ne!(counts[1], counts[2]);
    }

    #[test]
    fn test_profile_rejects_3d() {
        let error = profile(&AstNode::Sphere { r: 1.0, fn_: None }, LIMIT).unwrap_err();
        assert!(matches!(error, ConversionError::InvalidParameters { .. }));
    }

    #[test]
    fn test_huge_segment_counts_fail_before_allocating() {
        let error = sphere(1.0, Some(u32::MAX), LIMIT, Material::default()).unwrap_err();
        assert!(matches!(error, ConversionError::InvalidParameters { .. }));

        let dense = CylinderParams {
            fn_: Some(1 << 30),
            ..params(1.0, Some(1.0))
        };
        let error = cylinder(dense, LIMIT, Material::default()).unwrap_err();
        assert!(error.to_string().contains("limit is 50000"));

        let circle = AstNode::Circle {
            r: 1.0,
            fn_: Some(u32::MAX),
        };
        assert!(profile(&circle, LIMIT).is_err());
    }

    #[test]
    fn test_budget_is_inclusive() {
        // 32 * 30 triangles for the default sphere
        assert!(sphere(1.0, None, 960, Material::default()).is_ok());
        assert!(sphere(1.0, None, 959, Material::default()).is_err());
    }
}
