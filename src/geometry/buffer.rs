// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed triangle buffers backing a renderable mesh

use super::BoundingBox;
use crate::utils::math::triangle_cross;
use ahash::AHashMap;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangle geometry: the position/normal attributes plus an index buffer.
///
/// Geometry is treated as a GPU-side resource by the scene layer: once
/// [`Geometry::dispose`] has run the buffers are released and the geometry
/// reports itself empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    #[serde(skip)]
    disposed: bool,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
            disposed: false,
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a flat-shaded triangle with its own three vertices.
    /// Degenerate triangles (zero area) are skipped.
    pub fn add_flat_triangle(&mut self, p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) {
        let cross = triangle_cross(&p0, &p1, &p2);
        let length = cross.norm();
        if length.is_nan() || length <= f64::EPSILON {
            return;
        }
        let normal = cross / length;
        let a = self.add_vertex(Vertex::new(p0, normal));
        let b = self.add_vertex(Vertex::new(p1, normal));
        let c = self.add_vertex(Vertex::new(p2, normal));
        self.add_triangle(Triangle::new([a, b, c]));
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// No positions or no faces to draw
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Transform all vertices by a matrix.
    ///
    /// Normals use the inverse transpose. A matrix with a negative determinant
    /// turns the surface inside out, so triangle winding is reversed to keep
    /// faces pointing outward.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().map(|m| m.transpose());

        for vertex in &mut self.vertices {
            vertex.position = matrix.transform_point(&vertex.position);
            if let Some(nm) = &normal_matrix {
                let n = nm * vertex.normal;
                let length = n.norm();
                if length > f64::EPSILON {
                    vertex.normal = n / length;
                }
            }
        }

        if linear.determinant() < 0.0 {
            self.reverse_winding();
        }
    }

    /// Return a transformed copy
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Geometry {
        let mut copy = self.clone();
        copy.transform(matrix);
        copy
    }

    /// Reverse the index order of every triangle
    pub fn reverse_winding(&mut self) {
        for triangle in &mut self.triangles {
            triangle.indices.swap(1, 2);
        }
    }

    /// Merge with another geometry (no CSG, buffers are concatenated)
    pub fn merge(&mut self, other: &Geometry) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Weld vertices whose positions and normals agree within epsilon.
    /// Returns the number of vertices removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let quantize = |v: f64| (v / epsilon).round() as i64;
        let original_count = self.vertices.len();
        let mut lookup: AHashMap<[i64; 6], usize> = AHashMap::with_capacity(original_count);
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(original_count);
        let mut remap = vec![0usize; original_count];

        for (i, vertex) in self.vertices.iter().enumerate() {
            let key = [
                quantize(vertex.position.x),
                quantize(vertex.position.y),
                quantize(vertex.position.z),
                quantize(vertex.normal.x),
                quantize(vertex.normal.y),
                quantize(vertex.normal.z),
            ];
            remap[i] = *lookup.entry(key).or_insert_with(|| {
                new_vertices.push(*vertex);
                new_vertices.len() - 1
            });
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        self.vertices = new_vertices;
        original_count - self.vertices.len()
    }

    /// Remove triangles with repeated indices, out-of-range indices or no area.
    /// Returns the number of triangles removed.
    pub fn remove_degenerate_triangles(&mut self) -> usize {
        let original_count = self.triangles.len();
        let vertices = &self.vertices;

        self.triangles.retain(|triangle| {
            let [i0, i1, i2] = triangle.indices;
            if i0 == i1 || i1 == i2 || i0 == i2 {
                return false;
            }
            if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
                return false;
            }
            let cross = triangle_cross(
                &vertices[i0].position,
                &vertices[i1].position,
                &vertices[i2].position,
            );
            cross.norm() > f64::EPSILON
        });

        original_count - self.triangles.len()
    }

    /// Remove vertices not referenced by any triangle.
    /// Returns the number of vertices removed.
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in &triangle.indices {
                used[index] = true;
            }
        }

        let mut remap = vec![0usize; self.vertices.len()];
        let mut new_vertices = Vec::with_capacity(self.vertices.len());
        for (old_index, vertex) in self.vertices.iter().enumerate() {
            if used[old_index] {
                remap[old_index] = new_vertices.len();
                new_vertices.push(*vertex);
            }
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        let removed = self.vertices.len() - new_vertices.len();
        self.vertices = new_vertices;
        removed
    }

    /// Release the attribute and index buffers. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.vertices = Vec::new();
        self.triangles = Vec::new();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_triangle_skips_degenerate() {
        let mut geometry = Geometry::new();
        let p = Point3::new(1.0, 1.0, 1.0);
        geometry.add_flat_triangle(p, p, Point3::new(2.0, 0.0, 0.0));
        assert!(geometry.is_empty());

        geometry.add_flat_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(geometry.triangle_count(), 1);
        assert_relative_eq!(geometry.vertices[0].normal, Vector3::z());
    }

    #[test]
    fn test_negative_determinant_reverses_winding() {
        let mut geometry = Geometry::new();
        geometry.add_flat_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let before = geometry.triangles[0];

        geometry.transform(&Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0)));

        let after = geometry.triangles[0];
        assert_eq!(after.indices, [before.indices[0], before.indices[2], before.indices[1]]);
        let v = &geometry.vertices;
        let cross = triangle_cross(
            &v[after.indices[0]].position,
            &v[after.indices[1]].position,
            &v[after.indices[2]].position,
        );
        // Face orientation agrees with the transformed normal
        assert!(cross.dot(&v[0].normal) > 0.0);
    }

    #[test]
    fn test_weld_merges_shared_corners_only_with_same_normal() {
        let mut geometry = Primitive::cuboid(2.0, 2.0, 2.0).to_geometry();
        let before = geometry.vertex_count();
        let removed = geometry.weld_vertices(1e-6);
        // Box faces do not share normals, so nothing collapses
        assert_eq!(removed, 0);
        assert_eq!(geometry.vertex_count(), before);

        let mut doubled = geometry.clone();
        doubled.merge(&geometry);
        let removed = doubled.weld_vertices(1e-6);
        assert_eq!(removed, before);
        assert_eq!(doubled.triangle_count(), geometry.triangle_count() * 2);
    }

    #[test]
    fn test_cleanup_removes_degenerates_and_orphans() {
        let mut geometry = Geometry::new();
        let a = geometry.add_vertex(Vertex::new(Point3::origin(), Vector3::z()));
        let b = geometry.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z()));
        let c = geometry.add_vertex(Vertex::new(Point3::new(0.0, 1.0, 0.0), Vector3::z()));
        let d = geometry.add_vertex(Vertex::new(Point3::new(2.0, 0.0, 0.0), Vector3::z()));
        geometry.add_triangle(Triangle::new([a, b, c]));
        geometry.add_triangle(Triangle::new([a, b, d]));
        geometry.add_triangle(Triangle::new([a, a, c]));

        assert_eq!(geometry.remove_degenerate_triangles(), 2);
        assert_eq!(geometry.remove_orphaned_vertices(), 1);
        assert_eq!(geometry.vertex_count(), 3);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut geometry = Primitive::cuboid(1.0, 1.0, 1.0).to_geometry();
        geometry.dispose();
        geometry.dispose();
        assert!(geometry.is_disposed());
        assert!(geometry.is_empty());
    }
}
