// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between natural (full-resolution) and display space.
//
// Every conversion between the two spaces goes through `CoordinateMapper`.

use rindescan_core::error::{Result, ScanError};
use rindescan_core::{DisplayMapping, Point, Rectangle};

/// Converts rectangles and points between natural and display space for one
/// layout of one image. Build a new mapper whenever the display is resized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    mapping: DisplayMapping,
    natural_width: u32,
    natural_height: u32,
}

impl CoordinateMapper {
    pub fn new(mapping: DisplayMapping, natural_width: u32, natural_height: u32) -> Result<Self> {
        mapping.validate()?;
        if natural_width == 0 || natural_height == 0 {
            return Err(ScanError::InvalidMapping(format!(
                "natural size {natural_width}x{natural_height} has a zero side"
            )));
        }
        Ok(Self {
            mapping,
            natural_width,
            natural_height,
        })
    }

    pub fn mapping(&self) -> &DisplayMapping {
        &self.mapping
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn natural_bounds(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.natural_width as f64, self.natural_height as f64)
    }

    /// The displayed image in display space. This is the container the crop
    /// frame must stay inside.
    pub fn display_bounds(&self) -> Rectangle {
        self.natural_to_display(&self.natural_bounds())
    }

    /// Scale then translate. No rounding or clamping.
    pub fn natural_to_display(&self, rect: &Rectangle) -> Rectangle {
        let m = &self.mapping;
        Rectangle::new(
            rect.x * m.scale_x + m.origin_x,
            rect.y * m.scale_y + m.origin_y,
            rect.width * m.scale_x,
            rect.height * m.scale_y,
        )
    }

    /// Untranslate and unscale, round position and size to whole pixels,
    /// then clip to the natural image. Position and size are rounded
    /// separately, so a frame hanging off the left or top keeps its size and
    /// only loses what falls past the far edge.
    pub fn display_to_natural(&self, rect: &Rectangle) -> Rectangle {
        let m = &self.mapping;
        let max_width = self.natural_width as f64;
        let max_height = self.natural_height as f64;

        let x = ((rect.x - m.origin_x) / m.scale_x).round().clamp(0.0, max_width);
        let y = ((rect.y - m.origin_y) / m.scale_y).round().clamp(0.0, max_height);
        let width = (rect.width / m.scale_x).round().clamp(0.0, max_width - x);
        let height = (rect.height / m.scale_y).round().clamp(0.0, max_height - y);

        Rectangle::new(x, y, width, height)
    }

    pub fn to_display_point(&self, point: Point) -> Point {
        let m = &self.mapping;
        Point::new(point.x * m.scale_x + m.origin_x, point.y * m.scale_y + m.origin_y)
    }

    /// Display point to natural point, unrounded and unclamped.
    pub fn to_natural_point(&self, point: Point) -> Point {
        let m = &self.mapping;
        Point::new(
            (point.x - m.origin_x) / m.scale_x,
            (point.y - m.origin_y) / m.scale_y,
        )
    }
}
