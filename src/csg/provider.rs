// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operation provider interface

use crate::geometry::Geometry;
use crate::scene::Mesh;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure inside a boolean operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsgError {
    #[error("boolean result contains non-finite coordinates")]
    NonFinite,
    #[error("csg provider failed: {0}")]
    Provider(String),
}

/// Boolean operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Difference => "difference",
            Self::Intersection => "intersection",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that can combine two meshes.
///
/// Operands arrive with their world matrices up to date
/// ([`Mesh::update_matrix_world`]). Implementations bake those matrices into
/// the vertex data and return world-space geometry; materials are not part of
/// the result.
pub trait CsgProvider: Send + Sync {
    fn union(&self, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError>;

    fn subtract(&self, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError>;

    fn intersect(&self, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError>;

    fn apply(&self, op: BooleanOp, a: &Mesh, b: &Mesh) -> Result<Geometry, CsgError> {
        match op {
            BooleanOp::Union => self.union(a, b),
            BooleanOp::Difference => self.subtract(a, b),
            BooleanOp::Intersection => self.intersect(a, b),
        }
    }
}
