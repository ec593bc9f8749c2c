// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! scad-scene
//!
//! Converts OpenSCAD-style ASTs into renderable scene meshes: primitives with
//! OpenSCAD placement, transforms, boolean composition through a pluggable
//! CSG provider, and disposable mesh handles with metadata.

pub mod ast;
pub mod convert;
pub mod csg;
pub mod error;
pub mod geometry;
pub mod io;
pub mod scene;
pub mod utils;

pub use ast::AstNode;
pub use convert::{CancellationToken, ConversionConfig, Converter, MirrorMode};
pub use csg::{BooleanOp, BspCsg, CsgProvider};
pub use error::{ConversionError, RenderError};
pub use io::{export_stl, import_scad_file, parse_scad};
pub use scene::{MaterialConfig, MeshHandle, MeshMetadata, Scene};

/// Parse SCAD source and convert all root statements into one mesh,
/// on the calling thread and without a timeout
pub fn render(source: &str, config: &ConversionConfig) -> Result<MeshHandle, RenderError> {
    let nodes = parse_scad(source)?;
    render_nodes(&nodes, config)
}

/// Same as [`render`] for a `.scad` file
pub fn render_file(
    path: impl AsRef<std::path::Path>,
    config: &ConversionConfig,
) -> Result<MeshHandle, RenderError> {
    let nodes = import_scad_file(path)?;
    render_nodes(&nodes, config)
}

fn render_nodes(nodes: &[AstNode], config: &ConversionConfig) -> Result<MeshHandle, RenderError> {
    if nodes.is_empty() {
        return Err(ConversionError::EmptyUnion.into());
    }
    let root = AstNode::Union {
        children: nodes.to_vec(),
    };
    let handle = Converter::new().convert_blocking(&root, 0, config, &CancellationToken::new())?;
    Ok(handle)
}
