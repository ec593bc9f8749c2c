// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Abstract Syntax Tree module
//!
//! Defines the OpenSCAD-style AST consumed by the converter

mod json;
mod node;

pub use json::{from_json_str, from_json_value, AstError};
pub use node::{AstNode, ColorSpec, Size2, Size3, KNOWN_KINDS};
