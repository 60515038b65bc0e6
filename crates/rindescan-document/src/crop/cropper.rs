// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cropping at full resolution and JPEG compression of the result.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use rindescan_core::error::{Result, ScanError};
use rindescan_core::{ChannelLayout, CompressionConfig, PixelBuffer, Rectangle};
use tracing::{debug, info, instrument};

/// Copy the pixels of `region` out of `source` at full resolution.
///
/// Region edges are rounded to whole pixels and clipped to the image. A
/// region that ends up empty is a [`ScanError::DegenerateRegion`].
#[instrument(skip(source), fields(width = source.width, height = source.height))]
pub fn crop(source: &PixelBuffer, region: &Rectangle) -> Result<PixelBuffer> {
    source.validate()?;

    let max_x = source.width as f64;
    let max_y = source.height as f64;
    let left = region.x.round().clamp(0.0, max_x) as u32;
    let top = region.y.round().clamp(0.0, max_y) as u32;
    let right = region.right().round().clamp(0.0, max_x) as u32;
    let bottom = region.bottom().round().clamp(0.0, max_y) as u32;

    let width = right.saturating_sub(left);
    let height = bottom.saturating_sub(top);
    if width == 0 || height == 0 {
        return Err(ScanError::DegenerateRegion { width, height });
    }

    let channels = source.channels();
    let stride = source.row_stride();
    let row_len = width as usize * channels;
    let mut data = Vec::with_capacity(row_len * height as usize);
    for y in top..bottom {
        let start = y as usize * stride + left as usize * channels;
        data.extend_from_slice(&source.data[start..start + row_len]);
    }

    debug!(left, top, width, height, "region cropped");
    PixelBuffer::new(width, height, source.layout, data)
}

/// A compressed image ready to hand back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

impl EncodedImage {
    /// Write the encoded bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.bytes)?;
        info!(path = %path.as_ref().display(), bytes = self.bytes.len(), "image saved");
        Ok(())
    }
}

/// Encode as JPEG, first scaling down (never up) so neither side exceeds
/// `max_dimension` when one is configured.
#[instrument(skip(image, config), fields(width = image.width, height = image.height, quality = config.quality))]
pub fn compress(image: &PixelBuffer, config: &CompressionConfig) -> Result<EncodedImage> {
    config.validate()?;
    let mut dynamic = image.to_dynamic()?;

    if let Some(max) = config.max_dimension {
        if dynamic.width() > max || dynamic.height() > max {
            dynamic = dynamic.resize(max, max, FilterType::Lanczos3);
            debug!(width = dynamic.width(), height = dynamic.height(), "downscaled before encoding");
        }
    }

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, config.quality);
    let encoded = match image.layout {
        ChannelLayout::Gray => dynamic.to_luma8().write_with_encoder(encoder),
        ChannelLayout::Rgba => dynamic.to_rgb8().write_with_encoder(encoder),
    };
    encoded.map_err(|err| ScanError::Encoding(format!("JPEG encoding failed: {err}")))?;

    info!(bytes = bytes.len(), "image compressed");
    Ok(EncodedImage {
        bytes,
        width: dynamic.width(),
        height: dynamic.height(),
        mime_type: "image/jpeg",
    })
}
