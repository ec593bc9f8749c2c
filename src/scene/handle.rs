// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Disposable handle returned by a conversion

use super::{MaterialConfig, Mesh};
use crate::geometry::BoundingBox;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Descriptive record attached to every converted mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshMetadata {
    pub id: String,
    pub node_type: String,
    pub node_index: usize,
    pub triangle_count: usize,
    pub vertex_count: usize,
    pub bounding_box: BoundingBox,
    pub material: MaterialConfig,
    pub visible: bool,
}

impl MeshMetadata {
    /// Metadata for a mesh in its current world placement
    pub fn describe(mesh: &mut Mesh, node_type: &str, node_index: usize) -> Self {
        let world = mesh.world_geometry();
        let id = NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("mesh-{}-{}-{}", node_type, node_index, id),
            node_type: node_type.to_string(),
            node_index,
            triangle_count: world.triangle_count(),
            vertex_count: world.vertex_count(),
            bounding_box: world.bounding_box(),
            material: mesh.material.descriptor(),
            visible: true,
        }
    }

    /// Re-read counts, bounds and material; identity and visibility stay
    fn remeasure(&mut self, mesh: &mut Mesh) {
        let world = mesh.world_geometry();
        self.triangle_count = world.triangle_count();
        self.vertex_count = world.vertex_count();
        self.bounding_box = world.bounding_box();
        self.material = mesh.material.descriptor();
    }
}

/// Owns a converted mesh until it is disposed.
///
/// Disposal releases the geometry buffers and the material. Calling
/// [`MeshHandle::dispose`] more than once is harmless, and a handle that is
/// dropped without being disposed disposes itself.
#[derive(Debug)]
pub struct MeshHandle {
    mesh: Mesh,
    metadata: MeshMetadata,
    disposed: bool,
}

impl MeshHandle {
    pub fn new(mesh: Mesh, metadata: MeshMetadata) -> Self {
        Self {
            mesh,
            metadata,
            disposed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Direct access to the mesh. The metadata is a snapshot and is not
    /// updated by changes made here; follow them with
    /// [`MeshHandle::refresh_metadata`], or use [`MeshHandle::update_mesh`].
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    /// Change the mesh and bring the metadata up to date
    pub fn update_mesh(&mut self, f: impl FnOnce(&mut Mesh)) {
        f(&mut self.mesh);
        self.refresh_metadata();
    }

    /// Recompute triangle and vertex counts, world bounds and material from
    /// the mesh. A disposed handle keeps its last metadata.
    pub fn refresh_metadata(&mut self) {
        if self.disposed {
            return;
        }
        self.metadata.remeasure(&mut self.mesh);
    }

    pub fn metadata(&self) -> &MeshMetadata {
        &self.metadata
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.metadata.visible = visible;
    }

    /// Release GPU-side resources. Only the first call does any work.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.mesh.dispose();
        self.disposed = true;
        log::debug!("disposed {}", self.metadata.id);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for MeshHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use crate::scene::Material;
    use nalgebra::Vector3;

    fn handle() -> MeshHandle {
        let mut mesh = Mesh::new(
            Primitive::cuboid(2.0, 2.0, 2.0).to_geometry(),
            Material::default(),
        );
        mesh.transform.position = Vector3::new(1.0, 1.0, 1.0);
        let metadata = MeshMetadata::describe(&mut mesh, "cube", 3);
        MeshHandle::new(mesh, metadata)
    }

    #[test]
    fn test_metadata_uses_world_space() {
        let handle = handle();
        let metadata = handle.metadata();
        assert_eq!(metadata.node_type, "cube");
        assert_eq!(metadata.node_index, 3);
        assert_eq!(metadata.triangle_count, 12);
        assert_eq!(metadata.vertex_count, 24);
        assert!(metadata.visible);
        approx::assert_relative_eq!(
            metadata.bounding_box.min,
            nalgebra::Point3::origin(),
            epsilon = 1e-12
        );
        assert!(metadata.id.starts_with("mesh-cube-3-"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = handle();
        let b = handle();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut handle = handle();
        handle.dispose();
        handle.dispose();
        assert!(handle.is_disposed());
        assert!(handle.mesh().is_disposed());
        // metadata outlives the buffers
        assert_eq!(handle.metadata().triangle_count, 12);
    }

    #[test]
    fn test_refresh_follows_mesh_changes() {
        let mut handle = handle();
        let id = handle.id().to_string();
        handle.set_visible(false);

        handle.mesh_mut().transform.position = Vector3::new(10.0, 0.0, 0.0);
        // untouched until refreshed
        approx::assert_relative_eq!(handle.metadata().bounding_box.min.x, 0.0, epsilon = 1e-12);

        handle.refresh_metadata();
        let metadata = handle.metadata();
        approx::assert_relative_eq!(metadata.bounding_box.min.x, 9.0, epsilon = 1e-12);
        assert_eq!(metadata.id, id);
        assert_eq!(metadata.node_index, 3);
        assert!(!metadata.visible);

        handle.update_mesh(|mesh| mesh.material.set_opacity(0.25));
        assert_eq!(handle.metadata().material.opacity, 0.25);

        handle.dispose();
        handle.refresh_metadata();
        assert_eq!(handle.metadata().triangle_count, 12);
    }

    #[test]
    fn test_metadata_serializes() {
        let handle = handle();
        let json = serde_json::to_value(handle.metadata()).unwrap();
        assert_eq!(json["node_type"], "cube");
        assert_eq!(json["material"]["color"], "#00ff88");
    }
}
