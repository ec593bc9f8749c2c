// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on meshes

mod bsp;
pub mod provider;

pub use provider::{BooleanOp, CsgError, CsgProvider};

use crate::geometry::Geometry;
use crate::scene::Mesh;
use crate::utils::math::is_finite_vector;
use bsp::{polygons_from_geometry, polygons_to_geometry, BspTree};

/// Default provider: BSP-tree CSG over the meshes' world-space triangles
#[derive(Debug, Clone, Copy, Default)]
pub struct BspCsg;

impl BspCsg {
    pub fn new() -> Self {
        Self
    }

    fn trees(a: &Mesh, b: &Mesh) -> Result<(BspTree, BspTree), CsgError> {
        let a = world_geometry(a)?;
        let b = world_geometry(b)?;
        Ok((
            BspTree::new(polygons_from_geometry(&a)),
            BspTree::new(polygons_from_geometry(&b)),
        ))
    }
}

fn world_geometry(mesh: &Mesh) -> Result<Geometry, CsgError> {
    let geometry = mesh.geometry.transformed(mesh.matrix_world());
    check_finite(geometry)
}

fn check_finite(geometry: Geometry) -> Result<Geometry, CsgError> {
    if geometry
        .vertices
        .iter()
        .all(|v| is_finite_vector(&v.position.coords))
    {
        Ok(geometry)
    } else {
        Err(CsgError::NonFinite)
    }
}

impl CsgProvider for BspCsg {
    fn union(&self, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError> {
        let (mut a, mut b) = Self::trees(a, b)?;
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        check_finite(polygons_to_geometry(&a.all_polygons()))
    }

    fn subtract(&self, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError> {
        let (mut a, mut b) = Self::trees(a, b)?;
        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        a.invert();
        check_finite(polygons_to_geometry(&a.all_polygons()))
    }

    fn intersect(&self, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError> {
        let (mut a, mut b) = Self::trees(a, b)?;
        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(b.all_polygons());
        a.invert();
        check_finite(polygons_to_geometry(&a.all_polygons()))
    }
}
