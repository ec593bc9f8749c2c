// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion errors

use crate::csg::{BooleanOp, CsgError};
use crate::io::ParseError;
use crate::scene::MaterialError;
use thiserror::Error;

/// Why a node could not be turned into a mesh
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unsupported AST node type for CSG conversion: {kind}")]
    UnsupportedNode { kind: String },

    #[error("invalid {kind} parameters: {reason}")]
    InvalidParameters { kind: String, reason: String },

    #[error("{node} node must have children")]
    MissingChildren { node: String },

    #[error("{kind} child {index} failed: {source}")]
    Child {
        kind: String,
        index: usize,
        #[source]
        source: Box<ConversionError>,
    },

    #[error("{op} step {step} failed: {source}")]
    BooleanStep {
        op: BooleanOp,
        step: usize,
        #[source]
        source: CsgError,
    },

    #[error("{op} step {step} exceeds complexity limit: {triangles} triangles > {limit}")]
    ComplexityExceeded {
        op: BooleanOp,
        step: usize,
        triangles: usize,
        limit: usize,
    },

    #[error("conversion timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("conversion cancelled")]
    Cancelled,

    #[error("No AST nodes provided for CSG union")]
    EmptyUnion,

    #[error("{kind} conversion produced empty geometry")]
    EmptyGeometry { kind: String },

    #[error("invalid material: {0}")]
    Material(#[from] MaterialError),

    #[error("conversion worker failed: {0}")]
    Worker(String),
}

impl ConversionError {
    pub fn invalid(kind: &str, reason: impl Into<String>) -> Self {
        ConversionError::InvalidParameters {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    /// `"<Type> node must have children"` for the given kind
    pub fn missing_children(kind: &str) -> Self {
        ConversionError::MissingChildren {
            node: type_name(kind),
        }
    }

    /// Attach the failing child's position. Cancellation passes through as is.
    pub fn in_child(self, kind: &str, index: usize) -> Self {
        match self {
            ConversionError::Cancelled => self,
            other => ConversionError::Child {
                kind: kind.to_string(),
                index,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, following child wrappers
    pub fn root_cause(&self) -> &ConversionError {
        match self {
            ConversionError::Child { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ConversionError::Timeout { .. })
    }
}

/// Source-to-mesh failure
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// `linear_extrude` -> `LinearExtrude`
fn type_name(kind: &str) -> String {
    kind.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
