// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! BSP trees over convex polygons.
//!
//! Nodes live in a flat arena and every traversal uses an explicit stack, so
//! deep trees (convex inputs degenerate into a linked list) cannot overflow
//! the worker's call stack.

use crate::geometry::{Geometry, Triangle, Vertex};
use crate::utils::math::triangle_cross;
use nalgebra::{Point3, Vector3};

const PLANE_EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let cross = triangle_cross(a, b, c);
        let length = cross.norm();
        if !length.is_finite() || length <= f64::EPSILON {
            return None;
        }
        let normal = cross / length;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify(&self, point: &Point3<f64>) -> u8 {
        let distance = self.normal.dot(&point.coords) - self.w;
        if distance < -PLANE_EPSILON {
            BACK
        } else if distance > PLANE_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Sort `polygon` into the buckets relative to this plane, cutting it in
    /// two when it spans the plane.
    fn split_polygon(
        &self,
        polygon: Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.classify(&v.position))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon);
                } else {
                    coplanar_back.push(polygon);
                }
            }
            FRONT => front.push(polygon),
            BACK => back.push(polygon),
            _ => {
                let count = polygon.vertices.len();
                let mut f = Vec::with_capacity(count + 1);
                let mut b = Vec::with_capacity(count + 1);
                for i in 0..count {
                    let j = (i + 1) % count;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.position.coords))
                            / self.normal.dot(&(vj.position - vi.position));
                        let v = interpolate(vi, vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }
                if f.len() >= 3 {
                    front.push(Polygon {
                        vertices: f,
                        plane: polygon.plane,
                    });
                }
                if b.len() >= 3 {
                    back.push(Polygon {
                        vertices: b,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

fn interpolate(a: &Vertex, b: &Vertex, t: f64) -> Vertex {
    let normal = a.normal.lerp(&b.normal, t);
    let normal = normal.try_normalize(f64::EPSILON).unwrap_or(a.normal);
    Vertex::new(a.position + (b.position - a.position) * t, normal)
}

/// Convex planar polygon. Pieces cut from a polygon keep its plane.
#[derive(Debug, Clone)]
pub(crate) struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

impl Polygon {
    fn triangle(a: Vertex, b: Vertex, c: Vertex) -> Option<Self> {
        let plane = Plane::from_points(&a.position, &b.position, &c.position)?;
        Some(Self {
            vertices: vec![a, b, c],
            plane,
        })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
        self.plane.flip();
    }
}

/// Polygons for every non-degenerate triangle
pub(crate) fn polygons_from_geometry(geometry: &Geometry) -> Vec<Polygon> {
    geometry
        .triangles
        .iter()
        .filter_map(|triangle| {
            let [a, b, c] = triangle.indices.map(|i| geometry.vertices[i]);
            Polygon::triangle(a, b, c)
        })
        .collect()
}

/// Fan-triangulate polygons back into indexed geometry
pub(crate) fn polygons_to_geometry(polygons: &[Polygon]) -> Geometry {
    let mut geometry = Geometry::new();
    for polygon in polygons {
        let base = geometry.vertex_count();
        for vertex in &polygon.vertices {
            geometry.add_vertex(*vertex);
        }
        for i in 1..polygon.vertices.len() - 1 {
            let (a, b, c) = (
                &polygon.vertices[0].position,
                &polygon.vertices[i].position,
                &polygon.vertices[i + 1].position,
            );
            if triangle_cross(a, b, c).norm() > f64::EPSILON {
                geometry.add_triangle(Triangle::new([base, base + i, base + i + 1]));
            }
        }
    }
    geometry
}

#[derive(Debug, Default)]
struct Node {
    plane: Option<Plane>,
    front: Option<usize>,
    back: Option<usize>,
    polygons: Vec<Polygon>,
}

/// Solid represented as a BSP tree; node 0 is the root
#[derive(Debug)]
pub(crate) struct BspTree {
    nodes: Vec<Node>,
}

impl BspTree {
    pub(crate) fn new(polygons: Vec<Polygon>) -> Self {
        let mut tree = Self {
            nodes: vec![Node::default()],
        };
        tree.build(polygons);
        tree
    }

    /// Insert polygons, creating child nodes as needed
    pub(crate) fn build(&mut self, polygons: Vec<Polygon>) {
        let mut stack = vec![(0usize, polygons)];
        while let Some((index, polygons)) = stack.pop() {
            if polygons.is_empty() {
                continue;
            }
            let plane = *self.nodes[index]
                .plane
                .get_or_insert(polygons[0].plane);

            let mut coplanar = Vec::new();
            let mut coplanar_flipped = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                plane.split_polygon(
                    polygon,
                    &mut coplanar,
                    &mut coplanar_flipped,
                    &mut front,
                    &mut back,
                );
            }
            let node = &mut self.nodes[index];
            node.polygons.append(&mut coplanar);
            node.polygons.append(&mut coplanar_flipped);

            if !front.is_empty() {
                let child = self.child(index, true);
                stack.push((child, front));
            }
            if !back.is_empty() {
                let child = self.child(index, false);
                stack.push((child, back));
            }
        }
    }

    fn child(&mut self, index: usize, front: bool) -> usize {
        let existing = if front {
            self.nodes[index].front
        } else {
            self.nodes[index].back
        };
        if let Some(child) = existing {
            return child;
        }
        let child = self.nodes.len();
        self.nodes.push(Node::default());
        if front {
            self.nodes[index].front = Some(child);
        } else {
            self.nodes[index].back = Some(child);
        }
        child
    }

    /// Convert solid space to empty space and back
    pub(crate) fn invert(&mut self) {
        for node in &mut self.nodes {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut node.plane {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    /// Remove the parts of `polygons` inside this solid
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut kept = Vec::new();
        let mut stack = vec![(0usize, polygons)];
        while let Some((index, polygons)) = stack.pop() {
            let node = &self.nodes[index];
            let Some(plane) = node.plane else {
                kept.extend(polygons);
                continue;
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                let (mut cf, mut cb) = (Vec::new(), Vec::new());
                plane.split_polygon(polygon, &mut cf, &mut cb, &mut front, &mut back);
                front.append(&mut cf);
                back.append(&mut cb);
            }

            match node.front {
                Some(child) => stack.push((child, front)),
                None => kept.extend(front),
            }
            if let Some(child) = node.back {
                stack.push((child, back));
            }
        }
        kept
    }

    /// Remove the parts of this tree's polygons inside `other`
    pub(crate) fn clip_to(&mut self, other: &BspTree) {
        for node in &mut self.nodes {
            let polygons = std::mem::take(&mut node.polygons);
            node.polygons = other.clip_polygons(polygons);
        }
    }

    pub(crate) fn all_polygons(&self) -> Vec<Polygon> {
        self.nodes
            .iter()
            .flat_map(|node| node.polygons.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_degenerate_triangles_are_dropped() {
        let mut geometry = Primitive::cuboid(1.0, 1.0, 1.0).to_geometry();
        let a = geometry.add_vertex(Vertex::new(Point3::origin(), Vector3::z()));
        let b = geometry.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z()));
        geometry.add_triangle(Triangle::new([a, b, b]));

        assert_eq!(polygons_from_geometry(&geometry).len(), 12);
    }

    #[test]
    fn test_split_spanning_triangle() {
        let plane = Plane {
            normal: Vector3::x(),
            w: 0.0,
        };
        let polygon = Polygon::triangle(
            Vertex::new(Point3::new(-1.0, 0.0, 0.0), Vector3::z()),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z()),
            Vertex::new(Point3::new(1.0, 1.0, 0.0), Vector3::z()),
        )
        .unwrap();

        let (mut cf, mut cb, mut front, mut back) = (vec![], vec![], vec![], vec![]);
        plane.split_polygon(polygon, &mut cf, &mut cb, &mut front, &mut back);

        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 1);
        assert_eq!(front[0].vertices.len(), 4);
        assert_eq!(back[0].vertices.len(), 3);
        assert!(back[0].vertices.iter().all(|v| v.position.x <= 1e-12));
    }

    #[test]
    fn test_tree_keeps_all_polygons_of_convex_solid() {
        let geometry = Primitive::cuboid(1.0, 2.0, 3.0).to_geometry();
        let polygons = polygons_from_geometry(&geometry);
        let count = polygons.len();
        let tree = BspTree::new(polygons);
        // faces of a convex solid never straddle each other's planes
        assert_eq!(tree.all_polygons().len(), count);
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let geometry = Primitive::cuboid(2.0, 2.0, 2.0).to_geometry();
        let mut tree = BspTree::new(polygons_from_geometry(&geometry));
        let before = polygons_to_geometry(&tree.all_polygons()).bounding_box();
        tree.invert();
        tree.invert();
        let after = polygons_to_geometry(&tree.all_polygons()).bounding_box();
        assert!(before.approx_eq(&after, 1e-12));
    }
}
