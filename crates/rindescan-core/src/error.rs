// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for RindeScan.

use thiserror::Error;

/// Top-level error type for all RindeScan operations.
///
/// Detection never fails on "no document found": the boundary locator always
/// falls back to a default rectangle, so only buffer-level problems surface.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Input buffers --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    // -- Regions and coordinates --
    #[error("degenerate crop region: {width}x{height} after clamping")]
    DegenerateRegion { width: u32, height: u32 },

    #[error("invalid display mapping: {0}")]
    InvalidMapping(String),

    // -- Output --
    #[error("image encoding failed: {0}")]
    Encoding(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
