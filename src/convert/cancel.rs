// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use crate::error::ConversionError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked between conversion steps
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`CancellationToken::cancel`] was called on any clone
    pub fn check(&self) -> Result<(), ConversionError> {
        if self.is_cancelled() {
            Err(ConversionError::Cancelled)
        } else {
            Ok(())
        }
    }
}
