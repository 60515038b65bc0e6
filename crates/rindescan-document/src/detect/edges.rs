// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sobel edge detection producing a binary edge map.

use rindescan_core::error::{Result, ScanError};
use rindescan_core::{ChannelLayout, PixelBuffer};
use tracing::{debug, instrument};

/// Sample value marking an edge pixel in the output map.
pub const EDGE: u8 = 255;

/// Threshold the Sobel gradient magnitude of a gray buffer.
///
/// Output pixels are [`EDGE`] where `sqrt(gx² + gy²) > threshold`, else 0.
/// Border pixels lack a full 3x3 neighbourhood and are always 0, so images
/// narrower or shorter than 3 pixels yield an all-zero map.
#[instrument(skip(source), fields(width = source.width, height = source.height, threshold))]
pub fn detect_edges(source: &PixelBuffer, threshold: f64) -> Result<PixelBuffer> {
    source.validate()?;
    if source.layout != ChannelLayout::Gray {
        return Err(ScanError::InvalidImage(
            "edge detection expects a grayscale buffer".into(),
        ));
    }

    let width = source.width as usize;
    let height = source.height as usize;
    let mut edges = vec![0u8; width * height];

    if width < 3 || height < 3 {
        debug!("image too small to filter; returning empty edge map");
        return PixelBuffer::new(source.width, source.height, ChannelLayout::Gray, edges);
    }

    let p = |x: usize, y: usize| source.data[y * width + x] as i32;
    let mut edge_count = 0usize;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            // Gx: [-1 0 1; -2 0 2; -1 0 1]
            let gx = -p(x - 1, y - 1) + p(x + 1, y - 1) - 2 * p(x - 1, y) + 2 * p(x + 1, y)
                - p(x - 1, y + 1)
                + p(x + 1, y + 1);
            // Gy: [-1 -2 -1; 0 0 0; 1 2 1]
            let gy = -p(x - 1, y - 1) - 2 * p(x, y - 1) - p(x + 1, y - 1)
                + p(x - 1, y + 1)
                + 2 * p(x, y + 1)
                + p(x + 1, y + 1);

            let magnitude = (gx as f64).hypot(gy as f64);
            if magnitude > threshold {
                edges[y * width + x] = EDGE;
                edge_count += 1;
            }
        }
    }

    debug!(edge_count, "edge map computed");
    PixelBuffer::new(source.width, source.height, ChannelLayout::Gray, edges)
}
