// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop frame overlay: dims the area outside the frame and draws the outline
// and its eight handles onto a preview image.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use rindescan_core::{Point, Rectangle};

use super::controller::{FrameListener, HandleKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub frame_color: Rgba<u8>,
    pub handle_color: Rgba<u8>,
    pub frame_thickness: u32,
    /// Side of the square drawn for each handle, in display pixels.
    pub handle_size: u32,
    /// How much to darken pixels outside the frame, 0.0 to 1.0.
    pub dim_alpha: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            frame_color: Rgba([33, 150, 243, 255]),
            handle_color: Rgba([33, 150, 243, 255]),
            frame_thickness: 3,
            handle_size: 20,
            dim_alpha: 0.3,
        }
    }
}

/// Draw the crop frame over a copy of `preview`.
///
/// `preview` is the displayed image and `origin` is where its top-left
/// corner sits in display space; `frame` is in display space too.
pub fn render_overlay(
    preview: &RgbaImage,
    origin: Point,
    frame: &Rectangle,
    style: &OverlayStyle,
) -> RgbaImage {
    let mut canvas = preview.clone();

    let left = (frame.x - origin.x).round() as i64;
    let top = (frame.y - origin.y).round() as i64;
    let right = (frame.right() - origin.x).round() as i64;
    let bottom = (frame.bottom() - origin.y).round() as i64;

    let keep = 1.0 - style.dim_alpha.clamp(0.0, 1.0);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let (x, y) = (x as i64, y as i64);
        if x < left || x >= right || y < top || y >= bottom {
            for channel in &mut pixel.0[..3] {
                *channel = (*channel as f32 * keep).round() as u8;
            }
        }
    }

    let width = (right - left).max(0) as u32;
    let height = (bottom - top).max(0) as u32;
    if width == 0 || height == 0 {
        return canvas;
    }

    for t in 0..style.frame_thickness as i64 {
        let grow = 2 * t as u32;
        let outline = Rect::at((left - t) as i32, (top - t) as i32).of_size(width + grow, height + grow);
        draw_hollow_rect_mut(&mut canvas, outline, style.frame_color);
    }

    if style.handle_size > 0 {
        let half = style.handle_size as f64 / 2.0;
        for handle in HandleKind::ALL {
            let centre = handle.position(frame);
            let square = Rect::at(
                (centre.x - origin.x - half).round() as i32,
                (centre.y - origin.y - half).round() as i32,
            )
            .of_size(style.handle_size, style.handle_size);
            draw_filled_rect_mut(&mut canvas, square, style.handle_color);
        }
    }

    canvas
}

/// Frame listener that keeps the latest frame and redraws the preview on
/// demand.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    preview: RgbaImage,
    origin: Point,
    style: OverlayStyle,
    latest: Option<Rectangle>,
    updates: usize,
}

impl OverlayRenderer {
    pub fn new(preview: RgbaImage, origin: Point, style: OverlayStyle) -> Self {
        Self {
            preview,
            origin,
            style,
            latest: None,
            updates: 0,
        }
    }

    pub fn latest(&self) -> Option<Rectangle> {
        self.latest
    }

    /// Number of frame changes received so far.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// The preview with the latest frame drawn on it, or `None` before the
    /// first update.
    pub fn render(&self) -> Option<RgbaImage> {
        self.latest
            .map(|frame| render_overlay(&self.preview, self.origin, &frame, &self.style))
    }
}

impl FrameListener for OverlayRenderer {
    fn frame_changed(&mut self, frame: &Rectangle) {
        self.latest = Some(*frame);
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::controller::{CropFrameController, PointerEvent, PointerTarget};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn preview() -> RgbaImage {
        RgbaImage::from_pixel(100, 80, Rgba([200, 200, 200, 255]))
    }

    fn plain() -> OverlayStyle {
        OverlayStyle {
            frame_thickness: 1,
            handle_size: 0,
            ..OverlayStyle::default()
        }
    }

    #[test]
    fn outside_is_dimmed_inside_untouched() {
        let frame = Rectangle::new(20.0, 20.0, 40.0, 30.0);
        let out = render_overlay(&preview(), Point::new(0.0, 0.0), &frame, &plain());

        assert_eq!(out.get_pixel(5, 5), &Rgba([140, 140, 140, 255]));
        assert_eq!(out.get_pixel(40, 35), &Rgba([200, 200, 200, 255]));
        assert_eq!(out.get_pixel(20, 20), &plain().frame_color);
        assert_eq!(out.get_pixel(59, 49), &plain().frame_color);
    }

    #[test]
    fn origin_offsets_the_frame() {
        let frame = Rectangle::new(30.0, 30.0, 40.0, 30.0);
        let out = render_overlay(&preview(), Point::new(10.0, 10.0), &frame, &plain());
        assert_eq!(out.get_pixel(20, 20), &plain().frame_color);
        assert_eq!(out.get_pixel(19, 19)[0], 140);
    }

    #[test]
    fn handles_are_drawn_at_corners_and_midpoints() {
        let style = OverlayStyle {
            handle_size: 6,
            handle_color: Rgba([255, 0, 0, 255]),
            ..plain()
        };
        let frame = Rectangle::new(20.0, 20.0, 40.0, 30.0);
        let out = render_overlay(&preview(), Point::new(0.0, 0.0), &frame, &style);
        for handle in HandleKind::ALL {
            let p = handle.position(&frame);
            assert_eq!(out.get_pixel(p.x as u32, p.y as u32), &style.handle_color, "{handle}");
        }
    }

    #[test]
    fn frame_off_canvas_does_not_panic() {
        let frame = Rectangle::new(500.0, 500.0, 60.0, 60.0);
        let out = render_overlay(&preview(), Point::new(0.0, 0.0), &frame, &OverlayStyle::default());
        assert_eq!(out.dimensions(), (100, 80));
        assert_eq!(out.get_pixel(50, 40)[0], 140);
    }

    #[test]
    fn renderer_tracks_controller_updates() {
        let renderer = Rc::new(RefCell::new(OverlayRenderer::new(
            preview(),
            Point::new(0.0, 0.0),
            plain(),
        )));
        assert!(renderer.borrow().render().is_none());

        let mut controller = CropFrameController::new(
            Rectangle::new(20.0, 20.0, 50.0, 50.0),
            Rectangle::new(0.0, 0.0, 100.0, 80.0),
            20.0,
        );
        let sink = Rc::clone(&renderer);
        controller.add_listener(move |frame: &Rectangle| sink.borrow_mut().frame_changed(frame));

        controller.handle_event(PointerEvent::down(1, Point::new(30.0, 30.0), PointerTarget::DragArea));
        controller.handle_event(PointerEvent::moved(1, Point::new(35.0, 30.0)));
        controller.handle_event(PointerEvent::up(1, Point::new(35.0, 30.0)));

        let renderer = renderer.borrow();
        assert_eq!(renderer.updates(), 1);
        assert_eq!(renderer.latest(), Some(Rectangle::new(25.0, 20.0, 50.0, 50.0)));
        let image = renderer.render().unwrap();
        assert_eq!(image.get_pixel(25, 20), &plain().frame_color);
    }
}
