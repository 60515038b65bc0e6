// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the RindeScan crop engine: pixel buffers, rectangles,
// detection candidates and the natural/display coordinate mapping.

use image::{DynamicImage, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScanError};

/// Smallest width or height a crop frame may take, in pixels.
pub const MIN_SIZE: f64 = 50.0;

/// Unique identifier for a crop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pixel buffers
// ---------------------------------------------------------------------------

/// Sample layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// One 8-bit luma sample per pixel.
    Gray,
    /// Four 8-bit samples per pixel (red, green, blue, alpha).
    Rgba,
}

impl ChannelLayout {
    /// Number of samples stored per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgba => 4,
        }
    }
}

/// A raw, row-major 8-bit image.
///
/// Fields are public so callers can hand over buffers they already own; every
/// engine stage calls [`PixelBuffer::validate`] before touching the samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, checking that they match the dimensions.
    pub fn new(width: u32, height: u32, layout: ChannelLayout, data: Vec<u8>) -> Result<Self> {
        let buffer = Self {
            width,
            height,
            layout,
            data,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Build a buffer where every pixel equals `sample`.
    pub fn filled(width: u32, height: u32, layout: ChannelLayout, sample: &[u8]) -> Result<Self> {
        if sample.len() != layout.channels() {
            return Err(ScanError::InvalidImage(format!(
                "fill sample has {} channels, layout {:?} needs {}",
                sample.len(),
                layout,
                layout.channels()
            )));
        }
        let pixels = width as usize * height as usize;
        Self::new(width, height, layout, sample.repeat(pixels))
    }

    /// Check the `width * height * channels == data.len()` invariant and that
    /// neither dimension is zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScanError::InvalidImage(format!(
                "zero-sized image ({}x{})",
                self.width, self.height
            )));
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(self.layout.channels()))
            .ok_or_else(|| {
                ScanError::InvalidImage(format!(
                    "image dimensions {}x{} overflow",
                    self.width, self.height
                ))
            })?;
        if self.data.len() != expected {
            return Err(ScanError::InvalidImage(format!(
                "expected {} samples for a {}x{} {:?} image, got {}",
                expected,
                self.width,
                self.height,
                self.layout,
                self.data.len()
            )));
        }
        Ok(())
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Bytes per row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Samples of the pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels();
        let start = y as usize * self.row_stride() + x as usize * channels;
        self.data.get(start..start + channels)
    }

    /// The whole image as a rectangle in its own (natural) pixel space.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// Convert a decoded image. 8-bit luma stays gray; everything else is
    /// expanded to RGBA.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self {
                width: gray.width(),
                height: gray.height(),
                layout: ChannelLayout::Gray,
                data: gray.as_raw().clone(),
            },
            other => {
                let rgba = other.to_rgba8();
                Self {
                    width: rgba.width(),
                    height: rgba.height(),
                    layout: ChannelLayout::Rgba,
                    data: rgba.into_raw(),
                }
            }
        }
    }

    /// Decode encoded image bytes (JPEG, PNG, ...) as handed over by the
    /// acquisition layer.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| ScanError::InvalidImage(format!("failed to decode image: {err}")))?;
        let buffer = Self::from_dynamic(&image);
        buffer.validate()?;
        Ok(buffer)
    }

    /// Wrap a copy of the samples as a `DynamicImage`.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        self.validate()?;
        let mismatch = || ScanError::InvalidImage("buffer does not match its dimensions".into());
        match self.layout {
            ChannelLayout::Gray => GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch),
            ChannelLayout::Rgba => RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch),
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A position in some pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to `self`.
    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

/// An axis-aligned rectangle. All four values live in one pixel space
/// (natural or display); the type does not record which.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from the four edge coordinates.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Whether `self` lies entirely inside `bounds` (edges may touch).
    pub fn is_within(&self, bounds: &Rectangle) -> bool {
        const EPS: f64 = 1e-9;
        self.x >= bounds.x - EPS
            && self.y >= bounds.y - EPS
            && self.right() <= bounds.right() + EPS
            && self.bottom() <= bounds.bottom() + EPS
    }

    /// A rectangle covering `coverage` of each side of `bounds`, centred in it.
    pub fn centered(bounds: &Rectangle, coverage: f64) -> Self {
        let width = bounds.width * coverage;
        let height = bounds.height * coverage;
        Self::new(
            bounds.x + (bounds.width - width) / 2.0,
            bounds.y + (bounds.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Move and resize `self` so it fits inside `bounds`.
    ///
    /// Each side is grown to at least `min_size` (or the full bounds extent
    /// when the bounds are smaller than that) and shrunk to at most the bounds
    /// extent; the position is then shifted inwards.
    pub fn clamp_within(&self, bounds: &Rectangle, min_size: f64) -> Self {
        let width = clamp_extent(self.width, min_size, bounds.width);
        let height = clamp_extent(self.height, min_size, bounds.height);
        let x = self.x.min(bounds.right() - width).max(bounds.x);
        let y = self.y.min(bounds.bottom() - height).max(bounds.y);
        Self::new(x, y, width, height)
    }
}

fn clamp_extent(extent: f64, min_size: f64, available: f64) -> f64 {
    extent.max(min_size.min(available)).min(available)
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Which detector produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Boundaries inferred from the edge-map projections.
    Projection,
    /// The conservative centred box.
    Fallback,
}

/// A provisional document rectangle with a confidence score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateRectangle {
    pub rectangle: Rectangle,
    pub score: f64,
    pub source: CandidateSource,
}

/// Where the initial crop frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionSource {
    /// Projection candidate won the scoring.
    Projection,
    /// No convincing edges; the centred fallback box won.
    Fallback,
    /// No candidates at all; 10% margins on every side.
    Default,
    /// Coordinates supplied by a remote detection service.
    External,
}

/// The rectangle chosen as the starting point for manual correction, in
/// natural pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rectangle: Rectangle,
    pub score: f64,
    pub source: DetectionSource,
}

// ---------------------------------------------------------------------------
// Display mapping
// ---------------------------------------------------------------------------

/// How the natural image is laid out on screen: display pixels per natural
/// pixel and the display offset of the image's top-left corner.
///
/// Rebuild it whenever the displayed image is resized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMapping {
    pub scale_x: f64,
    pub scale_y: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl DisplayMapping {
    pub fn new(scale_x: f64, scale_y: f64, origin_x: f64, origin_y: f64) -> Result<Self> {
        let mapping = Self {
            scale_x,
            scale_y,
            origin_x,
            origin_y,
        };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Mapping for an image of `natural_width` x `natural_height` rendered at
    /// `displayed_width` x `displayed_height` with its top-left at `origin`.
    pub fn from_display_size(
        natural_width: u32,
        natural_height: u32,
        displayed_width: f64,
        displayed_height: f64,
        origin: Point,
    ) -> Result<Self> {
        if natural_width == 0 || natural_height == 0 {
            return Err(ScanError::InvalidMapping(format!(
                "natural size {natural_width}x{natural_height} has a zero side"
            )));
        }
        Self::new(
            displayed_width / natural_width as f64,
            displayed_height / natural_height as f64,
            origin.x,
            origin.y,
        )
    }

    /// Lay the image out centred inside a `container_width` x
    /// `container_height` box, scaled down to fit but never enlarged.
    pub fn fit_within(
        natural_width: u32,
        natural_height: u32,
        container_width: f64,
        container_height: f64,
    ) -> Result<Self> {
        if natural_width == 0 || natural_height == 0 {
            return Err(ScanError::InvalidMapping(format!(
                "natural size {natural_width}x{natural_height} has a zero side"
            )));
        }
        let scale = (container_width / natural_width as f64)
            .min(container_height / natural_height as f64)
            .min(1.0);
        let displayed_width = natural_width as f64 * scale;
        let displayed_height = natural_height as f64 * scale;
        Self::new(
            scale,
            scale,
            (container_width - displayed_width) / 2.0,
            (container_height - displayed_height) / 2.0,
        )
    }

    pub fn validate(&self) -> Result<()> {
        let scales_ok = [self.scale_x, self.scale_y]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0);
        if !scales_ok {
            return Err(ScanError::InvalidMapping(format!(
                "scale ({}, {}) must be finite and positive",
                self.scale_x, self.scale_y
            )));
        }
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(ScanError::InvalidMapping(format!(
                "origin ({}, {}) must be finite",
                self.origin_x, self.origin_y
            )));
        }
        Ok(())
    }
}
