// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessing: luma conversion and 3x3 smoothing ahead of edge detection.

use rindescan_core::error::{Result, ScanError};
use rindescan_core::{ChannelLayout, PixelBuffer};
use tracing::{debug, instrument};

/// 3x3 smoothing kernel, row-major. Weights sum to [`KERNEL_SUM`].
const KERNEL: [u32; 9] = [1, 2, 1, 2, 4, 2, 1, 2, 1];
const KERNEL_SUM: u32 = 16;

/// Convert to 8-bit luma with the Rec. 601 weights. Gray input is copied.
#[instrument(skip(source), fields(width = source.width, height = source.height))]
pub fn to_grayscale(source: &PixelBuffer) -> Result<PixelBuffer> {
    source.validate()?;
    let data = match source.layout {
        ChannelLayout::Gray => source.data.clone(),
        ChannelLayout::Rgba => source
            .data
            .chunks_exact(4)
            .map(|rgba| {
                let luma = 0.299 * rgba[0] as f64 + 0.587 * rgba[1] as f64 + 0.114 * rgba[2] as f64;
                luma.round().clamp(0.0, 255.0) as u8
            })
            .collect(),
    };
    PixelBuffer::new(source.width, source.height, ChannelLayout::Gray, data)
}

/// Apply the 3x3 Gaussian-like kernel to a gray buffer.
///
/// The outermost row and column on each side have no full neighbourhood and
/// are copied through unfiltered.
#[instrument(skip(source), fields(width = source.width, height = source.height))]
pub fn smooth(source: &PixelBuffer) -> Result<PixelBuffer> {
    source.validate()?;
    if source.layout != ChannelLayout::Gray {
        return Err(ScanError::InvalidImage(
            "smoothing expects a grayscale buffer".into(),
        ));
    }

    let width = source.width as usize;
    let height = source.height as usize;
    let src = &source.data;
    let mut out = src.clone();

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut sum = 0u32;
            let mut k = 0;
            for row in y - 1..=y + 1 {
                let base = row * width;
                for col in x - 1..=x + 1 {
                    sum += src[base + col] as u32 * KERNEL[k];
                    k += 1;
                }
            }
            // Round half up.
            out[y * width + x] = ((sum + KERNEL_SUM / 2) / KERNEL_SUM) as u8;
        }
    }

    debug!("smoothing complete");
    PixelBuffer::new(source.width, source.height, ChannelLayout::Gray, out)
}

/// Grayscale then smooth.
pub fn preprocess(source: &PixelBuffer) -> Result<PixelBuffer> {
    smooth(&to_grayscale(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, data: Vec<u8>) -> PixelBuffer {
        PixelBuffer::new(width, height, ChannelLayout::Gray, data).unwrap()
    }

    #[test]
    fn luma_uses_rec601_weights() {
        let rgba = PixelBuffer::new(
            3,
            1,
            ChannelLayout::Rgba,
            vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 0],
        )
        .unwrap();
        let out = to_grayscale(&rgba).unwrap();
        assert_eq!(out.layout, ChannelLayout::Gray);
        // 0.299 * 255 = 76.2, 0.587 * 255 = 149.7, 0.114 * 255 = 29.1
        assert_eq!(out.data, vec![76, 150, 29]);
    }

    #[test]
    fn grayscale_of_gray_is_identity() {
        let src = gray(2, 2, vec![1, 2, 3, 4]);
        assert_eq!(to_grayscale(&src).unwrap(), src);
    }

    #[test]
    fn zero_sized_buffer_is_rejected_before_any_work() {
        let empty = PixelBuffer {
            width: 0,
            height: 0,
            layout: ChannelLayout::Rgba,
            data: Vec::new(),
        };
        assert!(matches!(to_grayscale(&empty), Err(ScanError::InvalidImage(_))));
        assert!(matches!(preprocess(&empty), Err(ScanError::InvalidImage(_))));
    }

    #[test]
    fn smoothing_copies_border_and_filters_interior() {
        // Single bright pixel in the centre of a 3x3 image.
        let src = gray(3, 3, vec![0, 0, 0, 0, 160, 0, 0, 0, 0]);
        let out = smooth(&src).unwrap();
        // Interior: 160 * 4 / 16 = 40. Border pixels keep their zeros.
        assert_eq!(out.data, vec![0, 0, 0, 0, 40, 0, 0, 0, 0]);
    }

    #[test]
    fn smoothing_uniform_image_is_unchanged() {
        let src = gray(6, 5, vec![123; 30]);
        assert_eq!(smooth(&src).unwrap(), src);
    }

    #[test]
    fn smoothing_tiny_image_copies_everything() {
        let src = gray(2, 1, vec![9, 200]);
        assert_eq!(smooth(&src).unwrap(), src);
    }

    #[test]
    fn smoothing_rejects_rgba() {
        let rgba = PixelBuffer::filled(4, 4, ChannelLayout::Rgba, &[1, 2, 3, 255]).unwrap();
        assert!(matches!(smooth(&rgba), Err(ScanError::InvalidImage(_))));
    }
}
