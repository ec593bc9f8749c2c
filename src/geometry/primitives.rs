// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! Every primitive is generated centered on the origin with outward facing,
//! counter-clockwise triangles. Cylinders run along the Y axis (the scene is
//! Y-up); OpenSCAD placement is applied by the converter through the mesh
//! transform, not here.

use super::{Geometry, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Longitude segments used for spheres when no `$fn` is given
pub const SPHERE_WIDTH_SEGMENTS: u32 = 32;
/// Latitude segments used for spheres when no `$fn` is given
pub const SPHERE_HEIGHT_SEGMENTS: u32 = 16;
/// Radial segments used for cylinders and cones when no `$fn` is given
pub const CYLINDER_RADIAL_SEGMENTS: u32 = 32;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Box {
        width: f64,
        height: f64,
        depth: f64,
    },
    Sphere {
        radius: f64,
        width_segments: u32,
        height_segments: u32,
    },
    Cylinder {
        radius_top: f64,
        radius_bottom: f64,
        height: f64,
        radial_segments: u32,
    },
    Polyhedron {
        points: Vec<Point3<f64>>,
        faces: Vec<Vec<usize>>,
    },
}

impl Primitive {
    pub fn cuboid(width: f64, height: f64, depth: f64) -> Self {
        Self::Box {
            width,
            height,
            depth,
        }
    }

    pub fn sphere(radius: f64) -> Self {
        Self::sphere_with_segments(radius, SPHERE_WIDTH_SEGMENTS, SPHERE_HEIGHT_SEGMENTS)
    }

    pub fn sphere_with_segments(radius: f64, width_segments: u32, height_segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn cylinder(radius_top: f64, radius_bottom: f64, height: f64) -> Self {
        Self::cylinder_with_segments(radius_top, radius_bottom, height, CYLINDER_RADIAL_SEGMENTS)
    }

    pub fn cylinder_with_segments(
        radius_top: f64,
        radius_bottom: f64,
        height: f64,
        radial_segments: u32,
    ) -> Self {
        Self::Cylinder {
            radius_top,
            radius_bottom,
            height,
            radial_segments: radial_segments.max(3),
        }
    }

    /// Faces follow OpenSCAD's convention: clockwise when seen from outside
    pub fn polyhedron(points: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Self {
        Self::Polyhedron { points, faces }
    }

    pub fn to_geometry(&self) -> Geometry {
        match self {
            Self::Box {
                width,
                height,
                depth,
            } => generate_box(*width, *height, *depth),
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => generate_sphere(*radius, *width_segments, *height_segments),
            Self::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => generate_cylinder(*radius_top, *radius_bottom, *height, *radial_segments),
            Self::Polyhedron { points, faces } => generate_polyhedron(points, faces),
        }
    }

    /// Triangles [`Primitive::to_geometry`] would emit, without generating
    /// them. `None` when the count does not fit in a `usize`.
    pub fn triangle_count(&self) -> Option<usize> {
        match self {
            Self::Box { .. } => Some(12),
            Self::Sphere {
                width_segments,
                height_segments,
                ..
            } => {
                // pole rows emit one triangle per quad
                let rows = usize::try_from(*height_segments).ok()?.checked_mul(2)? - 2;
                usize::try_from(*width_segments).ok()?.checked_mul(rows)
            }
            Self::Cylinder {
                radius_top,
                radius_bottom,
                radial_segments,
                ..
            } => {
                let caps = [*radius_top, *radius_bottom]
                    .iter()
                    .filter(|&&r| r > 0.0)
                    .count();
                usize::try_from(*radial_segments).ok()?.checked_mul(2 + caps)
            }
            Self::Polyhedron { faces, .. } => faces
                .iter()
                .try_fold(0usize, |sum, face| sum.checked_add(face.len().saturating_sub(2))),
        }
    }
}

fn generate_box(width: f64, height: f64, depth: f64) -> Geometry {
    let mut geometry = Geometry::with_capacity(24, 12);
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);

    // (normal, u, v) with u x v == normal so each quad winds counter-clockwise
    let faces = [
        (Vector3::x(), Vector3::y(), Vector3::z()),
        (-Vector3::x(), Vector3::z(), Vector3::y()),
        (Vector3::y(), Vector3::z(), Vector3::x()),
        (-Vector3::y(), Vector3::x(), Vector3::z()),
        (Vector3::z(), Vector3::x(), Vector3::y()),
        (-Vector3::z(), Vector3::y(), Vector3::x()),
    ];

    for (normal, u, v) in faces {
        let center = Point3::from(normal.component_mul(&half));
        let du = u.component_mul(&half);
        let dv = v.component_mul(&half);

        let corners = [
            center - du - dv,
            center + du - dv,
            center + du + dv,
            center - du + dv,
        ];
        let base = geometry.vertex_count();
        for corner in corners {
            geometry.add_vertex(Vertex::new(corner, normal));
        }
        geometry.add_triangle(Triangle::new([base, base + 1, base + 2]));
        geometry.add_triangle(Triangle::new([base, base + 2, base + 3]));
    }

    geometry
}

fn generate_sphere(radius: f64, width_segments: u32, height_segments: u32) -> Geometry {
    let columns = width_segments as usize + 1;
    let rows = height_segments as usize + 1;
    let mut geometry = Geometry::with_capacity(
        columns * rows,
        2 * width_segments as usize * height_segments as usize,
    );

    for iy in 0..rows {
        let v = iy as f64 / height_segments as f64;
        for ix in 0..columns {
            let u = ix as f64 / width_segments as f64;
            let x = -radius * (u * 2.0 * PI).cos() * (v * PI).sin();
            let y = radius * (v * PI).cos();
            let z = radius * (u * 2.0 * PI).sin() * (v * PI).sin();

            let position = Point3::new(x, y, z);
            let normal = position.coords.try_normalize(f64::EPSILON).unwrap_or(Vector3::y());
            geometry.add_vertex(Vertex::new(position, normal));
        }
    }

    let at = |iy: usize, ix: usize| iy * columns + ix;
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = at(iy, ix + 1);
            let b = at(iy, ix);
            let c = at(iy + 1, ix);
            let d = at(iy + 1, ix + 1);

            // The pole rows collapse to a point, skip their zero-area halves
            if iy != 0 {
                geometry.add_triangle(Triangle::new([a, b, d]));
            }
            if iy != height_segments as usize - 1 {
                geometry.add_triangle(Triangle::new([b, c, d]));
            }
        }
    }

    geometry
}

fn generate_cylinder(radius_top: f64, radius_bottom: f64, height: f64, segments: u32) -> Geometry {
    let mut geometry = Geometry::new();
    let half_height = height / 2.0;
    let slope = if height != 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    // Torso: row 0 is the top ring, row 1 the bottom ring
    let mut rings = [Vec::new(), Vec::new()];
    for (row, ring) in rings.iter_mut().enumerate() {
        let v = row as f64;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        let y = -v * height + half_height;
        for x in 0..=segments {
            let theta = x as f64 / segments as f64 * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();
            let normal = Vector3::new(sin, slope, cos).normalize();
            ring.push(geometry.add_vertex(Vertex::new(
                Point3::new(radius * sin, y, radius * cos),
                normal,
            )));
        }
    }
    for x in 0..segments as usize {
        let a = rings[0][x];
        let b = rings[1][x];
        let c = rings[1][x + 1];
        let d = rings[0][x + 1];
        geometry.add_triangle(Triangle::new([a, b, d]));
        geometry.add_triangle(Triangle::new([b, c, d]));
    }

    if radius_top > 0.0 {
        generate_cap(&mut geometry, radius_top, half_height, segments, true);
    }
    if radius_bottom > 0.0 {
        generate_cap(&mut geometry, radius_bottom, -half_height, segments, false);
    }

    geometry
}

fn generate_cap(geometry: &mut Geometry, radius: f64, y: f64, segments: u32, top: bool) {
    let normal = if top { Vector3::y() } else { -Vector3::y() };
    let center = geometry.add_vertex(Vertex::new(Point3::new(0.0, y, 0.0), normal));

    let ring: Vec<usize> = (0..=segments)
        .map(|x| {
            let theta = x as f64 / segments as f64 * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();
            geometry.add_vertex(Vertex::new(
                Point3::new(radius * sin, y, radius * cos),
                normal,
            ))
        })
        .collect();

    for x in 0..segments as usize {
        let indices = if top {
            [ring[x], ring[x + 1], center]
        } else {
            [ring[x + 1], ring[x], center]
        };
        geometry.add_triangle(Triangle::new(indices));
    }
}

fn generate_polyhedron(points: &[Point3<f64>], faces: &[Vec<usize>]) -> Geometry {
    let mut geometry = Geometry::new();

    for face in faces {
        // Clockwise from outside, so walk it backwards and fan from the first point
        let ring: Vec<Point3<f64>> = face.iter().rev().map(|&i| points[i]).collect();
        for i in 1..ring.len().saturating_sub(1) {
            geometry.add_flat_triangle(ring[0], ring[i], ring[i + 1]);
        }
    }

    geometry
}
