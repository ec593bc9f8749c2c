// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Entry points: node in, disposable mesh handle out

use super::{context::Context, CancellationToken, ConversionConfig};
use crate::ast::AstNode;
use crate::csg::{BspCsg, CsgProvider};
use crate::error::ConversionError;
use crate::scene::{Mesh, MeshHandle, MeshMetadata};
use std::sync::Arc;

/// Converts AST nodes into meshes using a shared CSG provider.
///
/// Async conversions run on Tokio's blocking pool and are raced against
/// [`ConversionConfig::timeout_ms`]. When the timeout wins, the worker is
/// cancelled and stops at its next checkpoint (before a child conversion or
/// a boolean step); anything it had built is dropped and disposed.
#[derive(Clone)]
pub struct Converter {
    provider: Arc<dyn CsgProvider>,
}

impl Converter {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(BspCsg::new()))
    }

    pub fn with_provider(provider: Arc<dyn CsgProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn CsgProvider> {
        &self.provider
    }

    /// Convert one node. `index` is recorded in the handle's metadata.
    pub async fn convert(
        &self,
        node: &AstNode,
        index: usize,
        config: &ConversionConfig,
    ) -> Result<MeshHandle, ConversionError> {
        let kind = node.kind().to_string();
        let node = node.clone();
        self.run_with_timeout(kind, index, config, move |ctx| ctx.convert(&node))
            .await
    }

    /// Union of several root statements as one mesh
    pub async fn convert_nodes_to_union(
        &self,
        nodes: &[AstNode],
        config: &ConversionConfig,
    ) -> Result<MeshHandle, ConversionError> {
        if nodes.is_empty() {
            return Err(ConversionError::EmptyUnion);
        }
        let union = AstNode::Union {
            children: nodes.to_vec(),
        };
        self.convert(&union, 0, config).await
    }

    /// One handle per root node, in order. The first failure aborts.
    pub async fn convert_all(
        &self,
        nodes: &[AstNode],
        config: &ConversionConfig,
    ) -> Result<Vec<MeshHandle>, ConversionError> {
        let mut handles = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            handles.push(self.convert(node, index, config).await?);
        }
        Ok(handles)
    }

    /// Convert on the calling thread without a timeout
    pub fn convert_blocking(
        &self,
        node: &AstNode,
        index: usize,
        config: &ConversionConfig,
        token: &CancellationToken,
    ) -> Result<MeshHandle, ConversionError> {
        let ctx = Context::new(&*self.provider, config, token);
        let mesh = ctx.convert(node)?;
        package(mesh, node.kind(), index)
    }

    async fn run_with_timeout<F>(
        &self,
        kind: String,
        index: usize,
        config: &ConversionConfig,
        work: F,
    ) -> Result<MeshHandle, ConversionError>
    where
        F: FnOnce(&Context<'_>) -> Result<Mesh, ConversionError> + Send + 'static,
    {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let worker_config = config.clone();
        let provider = Arc::clone(&self.provider);

        let task = tokio::task::spawn_blocking(move || {
            let ctx = Context::new(&*provider, &worker_config, &worker_token);
            let mesh = work(&ctx)?;
            package(mesh, &kind, index)
        });

        match tokio::time::timeout(config.timeout(), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ConversionError::Worker(join_error.to_string())),
            Err(_) => {
                token.cancel();
                log::warn!(
                    "conversion of node {} timed out after {} ms, cancelling",
                    index,
                    config.timeout_ms
                );
                Err(ConversionError::Timeout {
                    timeout_ms: config.timeout_ms,
                })
            }
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

fn package(mut mesh: Mesh, kind: &str, index: usize) -> Result<MeshHandle, ConversionError> {
    if mesh.geometry.is_empty() {
        mesh.dispose();
        return Err(ConversionError::EmptyGeometry {
            kind: kind.to_string(),
        });
    }
    let metadata = MeshMetadata::describe(&mut mesh, kind, index);
    Ok(MeshHandle::new(mesh, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Size3;

    fn cube() -> AstNode {
        AstNode::Cube {
            size: Size3::Scalar(1.0),
            center: true,
        }
    }

    #[test]
    fn test_convert_blocking() {
        let handle = Converter::new()
            .convert_blocking(
                &cube(),
                7,
                &ConversionConfig::default(),
                &CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(handle.metadata().node_type, "cube");
        assert_eq!(handle.metadata().node_index, 7);
    }

    #[test]
    fn test_convert_blocking_observes_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let result =
            Converter::new().convert_blocking(&cube(), 0, &ConversionConfig::default(), &token);
        assert!(matches!(result, Err(ConversionError::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_union_rejected() {
        let error = Converter::new()
            .convert_nodes_to_union(&[], &ConversionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "No AST nodes provided for CSG union");
    }
}
