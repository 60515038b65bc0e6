// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RindeScan: Core types, configuration and error definitions shared by the
// detection and crop-correction crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::{CompressionConfig, DetectionConfig, FrameConfig, ScanConfig};
pub use error::ScanError;
pub use types::*;
