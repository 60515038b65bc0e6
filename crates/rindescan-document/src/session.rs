// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop session: one captured image from initial detection through manual
// correction to the final full-resolution crop.

use chrono::{DateTime, Utc};
use rindescan_core::error::Result;
use rindescan_core::{
    CompressionConfig, Detection, DetectionSource, DisplayMapping, PixelBuffer,
    Rectangle, ScanConfig, SessionId,
};
use tracing::{debug, info, instrument, warn};

use crate::crop::{EncodedImage, compress, crop};
use crate::detect::detect_document;
use crate::frame::{CoordinateMapper, CropFrameController, FrameListener, PointerEvent};

/// Score reported for coordinates supplied by an external detector.
const EXTERNAL_SCORE: f64 = 1.0;

/// The user-confirmed result of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutcome {
    pub session_id: SessionId,
    /// Cropped pixels at natural resolution.
    pub image: PixelBuffer,
    /// The cropped region in natural space.
    pub region: Rectangle,
    /// Where the frame started before manual correction.
    pub detection: Detection,
    pub completed_at: DateTime<Utc>,
}

impl CropOutcome {
    pub fn compress(&self, config: &CompressionConfig) -> Result<EncodedImage> {
        compress(&self.image, config)
    }

    pub fn suggested_file_name(&self) -> String {
        format!(
            "documento_recortado_{}.jpg",
            self.completed_at.timestamp_millis()
        )
    }
}

/// Drives the crop frame for one image. The controller works in display
/// space; everything handed back to the caller is in natural space.
#[derive(Debug)]
pub struct CropSession {
    id: SessionId,
    image: PixelBuffer,
    config: ScanConfig,
    detection: Detection,
    mapper: CoordinateMapper,
    controller: CropFrameController,
    started_at: DateTime<Utc>,
}

impl CropSession {
    /// Open a session. With a `seed` the external coordinates are used as
    /// is (clipped to the image); otherwise the detector runs.
    #[instrument(skip(image, seed, config), fields(width = image.width, height = image.height))]
    pub fn start(
        image: PixelBuffer,
        seed: Option<Rectangle>,
        mapping: DisplayMapping,
        config: ScanConfig,
    ) -> Result<Self> {
        image.validate()?;
        config.validate()?;

        let mapper = CoordinateMapper::new(mapping, image.width, image.height)?;

        let min_size = config.detection.min_size;
        let detection = match seed.and_then(|rect| external_detection(&image, rect, min_size)) {
            Some(detection) => detection,
            None => detect_document(&image, &config.detection)?,
        };

        let controller = CropFrameController::new(
            mapper.natural_to_display(&detection.rectangle),
            mapper.display_bounds(),
            config.frame.min_size,
        );

        let id = SessionId::new();
        info!(
            session = %id,
            source = ?detection.source,
            score = detection.score,
            rect = ?detection.rectangle,
            "crop session started"
        );

        Ok(Self {
            id,
            image,
            config,
            detection,
            mapper,
            controller,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn controller(&self) -> &CropFrameController {
        &self.controller
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The live frame in display space.
    pub fn frame(&self) -> Rectangle {
        self.controller.rectangle()
    }

    /// The live frame in natural space.
    pub fn natural_region(&self) -> Rectangle {
        self.mapper.display_to_natural(&self.controller.rectangle())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        self.controller.handle_event(event)
    }

    pub fn add_listener(&mut self, listener: impl FrameListener + 'static) {
        self.controller.add_listener(listener);
    }

    /// The displayed image changed size or position. The frame keeps its
    /// place on the document.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn relayout(&mut self, mapping: DisplayMapping) -> Result<()> {
        let (width, height) = self.mapper.natural_size();
        let mapper = CoordinateMapper::new(mapping, width, height)?;
        let natural = self.natural_region();

        self.controller
            .relayout(mapper.display_bounds(), mapper.natural_to_display(&natural));
        self.mapper = mapper;
        debug!(frame = ?self.controller.rectangle(), "frame carried over to new layout");
        Ok(())
    }

    /// Put the frame back to a centred box over the displayed image.
    pub fn reset_frame(&mut self) -> bool {
        let bounds = self.mapper.display_bounds();
        self.controller
            .set_rectangle(Rectangle::centered(&bounds, self.config.frame.reset_coverage))
    }

    /// Put the frame back where detection (or the external seed) placed it.
    pub fn reapply_detection(&mut self) -> bool {
        let frame = self.mapper.natural_to_display(&self.detection.rectangle);
        self.controller.set_rectangle(frame)
    }

    /// Finish the session and crop the original at full resolution.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn confirm(self) -> Result<CropOutcome> {
        if !self.controller.is_idle() {
            debug!("confirming with a gesture still active; using the live frame");
        }
        let region = self.natural_region();
        let image = crop(&self.image, &region)?;
        info!(
            width = image.width,
            height = image.height,
            x = region.x,
            y = region.y,
            "crop confirmed"
        );

        Ok(CropOutcome {
            session_id: self.id,
            image,
            region,
            detection: self.detection,
            completed_at: Utc::now(),
        })
    }
}

/// Wrap externally detected coordinates, clipped to the image and grown to
/// at least `min_size` natural pixels. Non-finite coordinates are discarded
/// so local detection runs instead.
fn external_detection(image: &PixelBuffer, seed: Rectangle, min_size: f64) -> Option<Detection> {
    let finite = [seed.x, seed.y, seed.width, seed.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        warn!(?seed, "external coordinates are not finite; running local detection");
        return None;
    }

    let rectangle = seed.clamp_within(&image.bounds(), min_size);
    if rectangle != seed {
        warn!(?seed, clamped = ?rectangle, "external coordinates clamped to the image");
    }
    Some(Detection {
        rectangle,
        score: EXTERNAL_SCORE,
        source: DetectionSource::External,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{HandleKind, PointerTarget};
    use image::{Rgba, RgbaImage};
    use rindescan_core::{ChannelLayout, Point, ScanError};
    use std::cell::Cell;
    use std::rc::Rc;

    /// 800x600 photo with a light sheet at x 200..600, y 100..500.
    fn photo() -> PixelBuffer {
        let mut img = RgbaImage::from_pixel(800, 600, Rgba([40, 40, 40, 255]));
        for y in 100..500 {
            for x in 200..600 {
                img.put_pixel(x, y, Rgba([235, 235, 235, 255]));
            }
        }
        PixelBuffer::from_dynamic(&image::DynamicImage::ImageRgba8(img))
    }

    fn half_scale() -> DisplayMapping {
        DisplayMapping::new(0.5, 0.5, 0.0, 0.0).unwrap()
    }

    #[test]
    fn start_detects_and_maps_to_display() {
        let session = CropSession::start(photo(), None, half_scale(), ScanConfig::default()).unwrap();
        assert_eq!(session.detection().source, DetectionSource::Projection);
        assert_eq!(
            session.controller().bounds(),
            Rectangle::new(0.0, 0.0, 400.0, 300.0)
        );

        let d = session.detection().rectangle;
        let frame = session.frame();
        assert!((frame.x - d.x / 2.0).abs() < 1e-9);
        assert!((frame.width - d.width / 2.0).abs() < 1e-9);
    }

    #[test]
    fn external_seed_bypasses_detection() {
        let seed = Rectangle::new(100.0, 50.0, 300.0, 200.0);
        let session =
            CropSession::start(photo(), Some(seed), half_scale(), ScanConfig::default()).unwrap();
        assert_eq!(session.detection().source, DetectionSource::External);
        assert_eq!(session.detection().rectangle, seed);
        assert_eq!(session.natural_region(), seed);
    }

    #[test]
    fn external_seed_is_clamped_and_nan_falls_back() {
        let seed = Rectangle::new(700.0, -20.0, 300.0, 200.0);
        let session =
            CropSession::start(photo(), Some(seed), half_scale(), ScanConfig::default()).unwrap();
        assert_eq!(session.detection().rectangle, Rectangle::new(500.0, 0.0, 300.0, 200.0));

        let nan = Rectangle::new(f64::NAN, 0.0, 10.0, 10.0);
        let session =
            CropSession::start(photo(), Some(nan), half_scale(), ScanConfig::default()).unwrap();
        assert_eq!(session.detection().source, DetectionSource::Projection);
    }

    #[test]
    fn invalid_mapping_fails_before_detection() {
        let mapping = DisplayMapping {
            scale_x: 0.0,
            scale_y: 0.5,
            origin_x: 0.0,
            origin_y: 0.0,
        };
        assert!(matches!(
            CropSession::start(photo(), None, mapping, ScanConfig::default()),
            Err(ScanError::InvalidMapping(_))
        ));

        let nan_origin = DisplayMapping {
            origin_x: f64::NAN,
            ..half_scale()
        };
        let seed = Some(Rectangle::new(0.0, 0.0, 100.0, 100.0));
        assert!(matches!(
            CropSession::start(photo(), seed, nan_origin, ScanConfig::default()),
            Err(ScanError::InvalidMapping(_))
        ));
    }

    #[test]
    fn external_seed_grows_to_configured_minimum() {
        let mut config = ScanConfig::default();
        config.detection.min_size = 120.0;
        let seed = Rectangle::new(760.0, 10.0, 30.0, 200.0);
        let session = CropSession::start(photo(), Some(seed), half_scale(), config).unwrap();
        assert_eq!(session.detection().rectangle, Rectangle::new(680.0, 10.0, 120.0, 200.0));
    }

    #[test]
    fn empty_image_cannot_start() {
        let empty = PixelBuffer {
            width: 0,
            height: 0,
            layout: ChannelLayout::Rgba,
            data: Vec::new(),
        };
        assert!(matches!(
            CropSession::start(empty, None, half_scale(), ScanConfig::default()),
            Err(ScanError::InvalidImage(_))
        ));
    }

    #[test]
    fn drag_then_confirm_crops_natural_pixels() {
        let seed = Rectangle::new(100.0, 100.0, 200.0, 200.0);
        let mut session =
            CropSession::start(photo(), Some(seed), half_scale(), ScanConfig::default()).unwrap();

        // Display frame is (50, 50, 100, 100); move it 25 px right in display space.
        session.handle_pointer(PointerEvent::down(1, Point::new(100.0, 100.0), PointerTarget::DragArea));
        session.handle_pointer(PointerEvent::moved(1, Point::new(125.0, 100.0)));
        session.handle_pointer(PointerEvent::up(1, Point::new(125.0, 100.0)));

        let expected = Rectangle::new(150.0, 100.0, 200.0, 200.0);
        assert_eq!(session.natural_region(), expected);

        let source = session.image().clone();
        let outcome = session.confirm().unwrap();
        assert_eq!(outcome.region, expected);
        assert_eq!((outcome.image.width, outcome.image.height), (200, 200));
        assert_eq!(outcome.image.pixel(0, 0), source.pixel(150, 100));
        assert_eq!(outcome.image.pixel(50, 0), source.pixel(200, 100));
        assert_eq!(outcome.detection.rectangle, seed);
    }

    #[test]
    fn reset_and_reapply_restore_frame() {
        let seed = Rectangle::new(100.0, 100.0, 200.0, 200.0);
        let mut session =
            CropSession::start(photo(), Some(seed), half_scale(), ScanConfig::default()).unwrap();

        session.handle_pointer(PointerEvent::down(
            1,
            Point::new(150.0, 150.0),
            PointerTarget::Handle(HandleKind::BottomRight),
        ));
        session.handle_pointer(PointerEvent::moved(1, Point::new(300.0, 250.0)));
        session.handle_pointer(PointerEvent::up(1, Point::new(300.0, 250.0)));
        assert_ne!(session.natural_region(), seed);

        assert!(session.reset_frame());
        assert_eq!(session.frame(), Rectangle::new(50.0, 37.5, 300.0, 225.0));

        assert!(session.reapply_detection());
        assert_eq!(session.natural_region(), seed);
    }

    #[test]
    fn relayout_keeps_frame_on_the_document() {
        let seed = Rectangle::new(100.0, 100.0, 200.0, 200.0);
        let mut session =
            CropSession::start(photo(), Some(seed), half_scale(), ScanConfig::default()).unwrap();

        // Window grew: image now shown at full size, centred with a 40 px gutter.
        let mapping = DisplayMapping::fit_within(800, 600, 880.0, 600.0).unwrap();
        session.relayout(mapping).unwrap();

        assert_eq!(
            session.controller().bounds(),
            Rectangle::new(40.0, 0.0, 800.0, 600.0)
        );
        assert_eq!(session.frame(), Rectangle::new(140.0, 100.0, 200.0, 200.0));
        assert_eq!(session.natural_region(), seed);
    }

    #[test]
    fn listeners_follow_session_changes() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let mut session =
            CropSession::start(photo(), None, half_scale(), ScanConfig::default()).unwrap();
        session.add_listener(move |_: &Rectangle| seen.set(seen.get() + 1));

        session.reset_frame();
        session.reapply_detection();
        session.relayout(half_scale()).unwrap();
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn outcome_helpers() {
        let seed = Rectangle::new(0.0, 0.0, 400.0, 300.0);
        let session =
            CropSession::start(photo(), Some(seed), half_scale(), ScanConfig::default()).unwrap();
        let outcome = session.confirm().unwrap();

        let name = outcome.suggested_file_name();
        assert!(name.starts_with("documento_recortado_") && name.ends_with(".jpg"), "{name}");

        let encoded = outcome.compress(&CompressionConfig::default()).unwrap();
        assert_eq!((encoded.width, encoded.height), (400, 300));
    }
}
