// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! AST Node definitions

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Scalar or per-axis size, e.g. `cube(2)` vs `cube([1, 2, 3])`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size3 {
    Scalar(f64),
    Vector([f64; 3]),
}

impl Size3 {
    pub fn to_vector(self) -> Vector3<f64> {
        match self {
            Size3::Scalar(s) => Vector3::repeat(s),
            Size3::Vector(v) => Vector3::from(v),
        }
    }
}

impl Default for Size3 {
    fn default() -> Self {
        Size3::Scalar(1.0)
    }
}

/// Scalar or per-axis size of a 2D shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Size2 {
    Scalar(f64),
    Vector([f64; 2]),
}

impl Size2 {
    pub fn to_vector(self) -> Vector2<f64> {
        match self {
            Size2::Scalar(s) => Vector2::repeat(s),
            Size2::Vector(v) => Vector2::from(v),
        }
    }
}

impl Default for Size2 {
    fn default() -> Self {
        Size2::Scalar(1.0)
    }
}

/// Color argument: a name / hex string or RGB(A) components in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Name(String),
    Components(Vec<f64>),
}

fn one() -> f64 {
    1.0
}

fn full_turn() -> f64 {
    360.0
}

/// A parsed OpenSCAD statement. Conversion only ever borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AstNode {
    // 3D primitives
    Cube {
        #[serde(default)]
        size: Size3,
        #[serde(default)]
        center: bool,
    },
    Sphere {
        #[serde(default = "one")]
        r: f64,
        #[serde(rename = "$fn", default, skip_serializing_if = "Option::is_none")]
        fn_: Option<u32>,
    },
    Cylinder {
        #[serde(default = "one")]
        h: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        r: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        r1: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        r2: Option<f64>,
        #[serde(default)]
        center: bool,
        #[serde(rename = "$fn", default, skip_serializing_if = "Option::is_none")]
        fn_: Option<u32>,
    },
    Polyhedron {
        points: Vec<[f64; 3]>,
        faces: Vec<Vec<usize>>,
    },

    // 2D primitives, only meaningful under an extrusion
    Circle {
        #[serde(default = "one")]
        r: f64,
        #[serde(rename = "$fn", default, skip_serializing_if = "Option::is_none")]
        fn_: Option<u32>,
    },
    Square {
        #[serde(default)]
        size: Size2,
        #[serde(default)]
        center: bool,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },

    // Transformations
    Translate {
        v: [f64; 3],
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Rotate {
        a: [f64; 3],
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Scale {
        v: [f64; 3],
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Mirror {
        v: [f64; 3],
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Multmatrix {
        m: Vec<Vec<f64>>,
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Color {
        c: ColorSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alpha: Option<f64>,
        #[serde(default)]
        children: Vec<AstNode>,
    },

    // Boolean operations
    Union {
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Intersection {
        #[serde(default)]
        children: Vec<AstNode>,
    },
    Difference {
        #[serde(default)]
        children: Vec<AstNode>,
    },

    // Extrusions
    LinearExtrude {
        #[serde(default = "one")]
        height: f64,
        #[serde(default)]
        center: bool,
        #[serde(default)]
        children: Vec<AstNode>,
    },
    RotateExtrude {
        #[serde(default = "full_turn")]
        angle: f64,
        #[serde(rename = "$fn", default, skip_serializing_if = "Option::is_none")]
        fn_: Option<u32>,
        #[serde(default)]
        children: Vec<AstNode>,
    },

    /// A statement this crate cannot convert, kept so the error can name it
    Unsupported { kind: String },
}

/// Every `type` tag that deserializes into a dedicated variant
pub const KNOWN_KINDS: &[&str] = &[
    "cube",
    "sphere",
    "cylinder",
    "polyhedron",
    "circle",
    "square",
    "polygon",
    "translate",
    "rotate",
    "scale",
    "mirror",
    "multmatrix",
    "color",
    "union",
    "intersection",
    "difference",
    "linear_extrude",
    "rotate_extrude",
];

impl AstNode {
    pub fn unsupported(kind: impl Into<String>) -> Self {
        AstNode::Unsupported { kind: kind.into() }
    }

    /// The node's `type` tag
    pub fn kind(&self) -> &str {
        match self {
            AstNode::Cube { .. } => "cube",
            AstNode::Sphere { .. } => "sphere",
            AstNode::Cylinder { .. } => "cylinder",
            AstNode::Polyhedron { .. } => "polyhedron",
            AstNode::Circle { .. } => "circle",
            AstNode::Square { .. } => "square",
            AstNode::Polygon { .. } => "polygon",
            AstNode::Translate { .. } => "translate",
            AstNode::Rotate { .. } => "rotate",
            AstNode::Scale { .. } => "scale",
            AstNode::Mirror { .. } => "mirror",
            AstNode::Multmatrix { .. } => "multmatrix",
            AstNode::Color { .. } => "color",
            AstNode::Union { .. } => "union",
            AstNode::Intersection { .. } => "intersection",
            AstNode::Difference { .. } => "difference",
            AstNode::LinearExtrude { .. } => "linear_extrude",
            AstNode::RotateExtrude { .. } => "rotate_extrude",
            AstNode::Unsupported { kind } => kind,
        }
    }

    pub fn children(&self) -> &[AstNode] {
        match self {
            AstNode::Translate { children, .. }
            | AstNode::Rotate { children, .. }
            | AstNode::Scale { children, .. }
            | AstNode::Mirror { children, .. }
            | AstNode::Multmatrix { children, .. }
            | AstNode::Color { children, .. }
            | AstNode::Union { children }
            | AstNode::Intersection { children }
            | AstNode::Difference { children }
            | AstNode::LinearExtrude { children, .. }
            | AstNode::RotateExtrude { children, .. } => children,
            _ => &[],
        }
    }

    pub fn is_2d(&self) -> bool {
        matches!(
            self,
            AstNode::Circle { .. } | AstNode::Square { .. } | AstNode::Polygon { .. }
        )
    }

    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(AstNode::node_count).sum::<usize>()
    }
}
