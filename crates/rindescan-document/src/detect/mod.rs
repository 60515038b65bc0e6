// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection pipeline: grayscale, smoothing, Sobel edges, projection-based
// boundary location.

pub mod boundary;
pub mod edges;
pub mod preprocess;

use rindescan_core::error::Result;
use rindescan_core::{DetectionConfig, Detection, PixelBuffer};
use tracing::instrument;

pub use boundary::{Projections, locate};
pub use edges::detect_edges;
pub use preprocess::{preprocess, smooth, to_grayscale};

/// Run the whole detection pipeline over a captured image.
///
/// Runs synchronously in O(width x height). Only an invalid buffer is an
/// error; weak or missing edges fall back to a default rectangle.
#[instrument(skip_all, fields(width = image.width, height = image.height))]
pub fn detect_document(image: &PixelBuffer, config: &DetectionConfig) -> Result<Detection> {
    let smoothed = preprocess(image)?;
    let edges = detect_edges(&smoothed, config.edge_threshold)?;
    locate(&edges, config)
}
