// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Renderable mesh: geometry + material + local transform

use super::{Material, Transform};
use crate::geometry::{BoundingBox, Geometry};
use nalgebra::Matrix4;

/// A scene object. Meshes produced by conversion have no parent, so the
/// world matrix is the local matrix once [`Mesh::update_matrix_world`] ran.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    matrix_world: Matrix4<f64>,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::identity(),
            matrix_world: Matrix4::identity(),
        }
    }

    /// Recompute the cached world matrix from the local transform
    pub fn update_matrix_world(&mut self) {
        self.matrix_world = self.transform.matrix();
    }

    pub fn matrix_world(&self) -> &Matrix4<f64> {
        &self.matrix_world
    }

    /// Geometry with the world matrix applied
    pub fn world_geometry(&mut self) -> Geometry {
        self.update_matrix_world();
        self.geometry.transformed(&self.matrix_world)
    }

    /// World-space bounding box
    pub fn world_bounding_box(&mut self) -> BoundingBox {
        self.world_geometry().bounding_box()
    }

    /// Move the world transform into the vertex data and reset the transform
    pub fn bake_transform(&mut self) {
        self.update_matrix_world();
        if !self.transform.is_identity() {
            self.geometry.transform(&self.matrix_world);
        }
        self.transform = Transform::identity();
        self.matrix_world = Matrix4::identity();
    }

    /// Release geometry and material
    pub fn dispose(&mut self) {
        self.geometry.dispose();
        self.material.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.geometry.is_disposed() && self.material.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn unit_box() -> Mesh {
        Mesh::new(
            Primitive::cuboid(1.0, 1.0, 1.0).to_geometry(),
            Material::default(),
        )
    }

    #[test]
    fn test_world_bounding_box_follows_transform() {
        let mut mesh = unit_box();
        mesh.transform.position = Vector3::new(5.0, 0.0, 0.0);
        mesh.transform.scale = Vector3::new(2.0, 1.0, 1.0);

        let bbox = mesh.world_bounding_box();
        assert_relative_eq!(bbox.min, Point3::new(4.0, -0.5, -0.5), epsilon = 1e-12);
        assert_relative_eq!(bbox.max, Point3::new(6.0, 0.5, 0.5), epsilon = 1e-12);
        // local geometry is untouched
        assert_relative_eq!(
            mesh.geometry.bounding_box().max,
            Point3::new(0.5, 0.5, 0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_bake_transform() {
        let mut mesh = unit_box();
        mesh.transform.position = Vector3::new(0.0, 3.0, 0.0);
        mesh.bake_transform();

        assert!(mesh.transform.is_identity());
        assert_eq!(*mesh.matrix_world(), Matrix4::identity());
        assert_relative_eq!(
            mesh.geometry.bounding_box().min,
            Point3::new(-0.5, 2.5, -0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_dispose_releases_both() {
        let mut mesh = unit_box();
        mesh.dispose();
        mesh.dispose();
        assert!(mesh.is_disposed());
        assert!(mesh.geometry.is_empty());
    }
}
