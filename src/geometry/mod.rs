// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - triangle buffers, primitives and extrusions

mod bbox;
mod buffer;
mod extrude;
mod primitives;
mod profile;

pub use bbox::BoundingBox;
pub use buffer::{Geometry, Triangle, Vertex};
pub use extrude::{
    linear_extrude, linear_extrude_triangle_count, rotate_extrude, rotate_extrude_triangle_count,
};
pub use primitives::{
    Primitive, CYLINDER_RADIAL_SEGMENTS, SPHERE_HEIGHT_SEGMENTS, SPHERE_WIDTH_SEGMENTS,
};
pub use profile::Profile;
