// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! AST to mesh conversion

mod boolean;
mod cancel;
mod config;
mod context;
mod orchestrator;
mod primitive;
mod transform;

pub use cancel::CancellationToken;
pub use config::{
    ConfigError, ConversionConfig, MirrorMode, CONFIG_FILE_NAME, ENV_COLOR, ENV_MAX_COMPLEXITY,
    ENV_TIMEOUT_MS,
};
pub use orchestrator::Converter;
