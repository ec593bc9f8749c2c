// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Single-owner container for converted meshes

use super::MeshHandle;
use crate::geometry::BoundingBox;
use ahash::AHashMap;

/// Holds mesh handles in insertion order. Removing a handle disposes it.
#[derive(Debug, Default)]
pub struct Scene {
    handles: Vec<MeshHandle>,
    index: AHashMap<String, usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle, replacing (and disposing) any handle with the same id
    pub fn add(&mut self, handle: MeshHandle) -> String {
        let id = handle.id().to_string();
        if let Some(&slot) = self.index.get(&id) {
            let mut previous = std::mem::replace(&mut self.handles[slot], handle);
            previous.dispose();
        } else {
            self.index.insert(id.clone(), self.handles.len());
            self.handles.push(handle);
        }
        id
    }

    /// Remove and dispose a handle. Returns false when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(slot) = self.index.remove(id) else {
            return false;
        };
        let mut handle = self.handles.remove(slot);
        handle.dispose();
        self.reindex();
        true
    }

    /// Dispose everything currently held and take the given handles instead
    pub fn replace_all(&mut self, handles: impl IntoIterator<Item = MeshHandle>) {
        self.clear();
        for handle in handles {
            self.add(handle);
        }
    }

    pub fn clear(&mut self) {
        for handle in &mut self.handles {
            handle.dispose();
        }
        self.handles.clear();
        self.index.clear();
    }

    pub fn get(&self, id: &str) -> Option<&MeshHandle> {
        self.index.get(id).map(|&slot| &self.handles[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MeshHandle> {
        self.index.get(id).map(|&slot| &mut self.handles[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeshHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Union of the world bounding boxes of visible meshes
    pub fn bounding_box(&self) -> BoundingBox {
        self.handles
            .iter()
            .filter(|handle| handle.metadata().visible)
            .fold(BoundingBox::empty(), |acc, handle| {
                acc.union(&handle.metadata().bounding_box)
            })
    }

    pub fn triangle_count(&self) -> usize {
        self.handles
            .iter()
            .map(|handle| handle.metadata().triangle_count)
            .sum()
    }

    fn reindex(&mut self) {
        self.index = self
            .handles
            .iter()
            .enumerate()
            .map(|(slot, handle)| (handle.id().to_string(), slot))
            .collect();
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.clear();
    }
}
