// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Retained scene objects produced by conversion

pub mod graph;
pub mod handle;
pub mod material;
pub mod mesh;
pub mod transform;

pub use graph::Scene;
pub use handle::{MeshHandle, MeshMetadata};
pub use material::{Color, Material, MaterialConfig, MaterialError, Side};
pub use mesh::Mesh;
pub use transform::Transform;
