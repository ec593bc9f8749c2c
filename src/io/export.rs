// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh exporters

use crate::scene::{MeshHandle, MeshMetadata};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mesh {0} has been disposed")]
    Disposed(String),
}

/// Write the mesh in world space as binary STL
pub fn export_stl(handle: &MeshHandle, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if handle.is_disposed() {
        return Err(ExportError::Disposed(handle.id().to_string()));
    }

    let mut file = BufWriter::new(File::create(path).map_err(io_error)?);
    write_stl(handle, &mut file).map_err(io_error)?;
    file.flush().map_err(io_error)
}

/// Binary STL into any writer
pub fn write_stl(handle: &MeshHandle, writer: &mut impl Write) -> std::io::Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let world = handle.mesh().clone().world_geometry();
    let vertex = |p: &nalgebra::Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);

    let triangles: Vec<StlTriangle> = world
        .triangles
        .iter()
        .map(|tri| {
            let [v0, v1, v2] = tri.indices.map(|i| &world.vertices[i]);
            let normal = (v0.normal + v1.normal + v2.normal)
                .try_normalize(f64::EPSILON)
                .unwrap_or_default();

            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [vertex(&v0.position), vertex(&v1.position), vertex(&v2.position)],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

/// Metadata of several handles as a pretty JSON array
pub fn metadata_json<'a>(
    metadata: impl IntoIterator<Item = &'a MeshMetadata>,
) -> Result<String, ExportError> {
    let records: Vec<&MeshMetadata> = metadata.into_iter().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
