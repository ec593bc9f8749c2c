// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - parsing and exporting

mod export;
mod parser;

pub use export::{export_stl, metadata_json, write_stl, ExportError};
pub use parser::{import_scad_file, parse_scad, ParseError};
