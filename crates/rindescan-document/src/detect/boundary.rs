// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary location: turns a binary edge map into a scored document
// rectangle using row/column edge projections.
//
// The result is a starting point for manual correction, not a guarantee: a
// conservative centred box always competes with the projection candidate, so
// detection degrades to "start from a default frame" rather than failing.

use rindescan_core::error::{Result, ScanError};
use rindescan_core::{
    CandidateRectangle, CandidateSource, ChannelLayout, DetectionConfig, Detection,
    DetectionSource, MIN_SIZE, PixelBuffer, Rectangle,
};
use tracing::{debug, info, instrument, warn};

/// Edge pixel counts per row (`rows`, the horizontal projection) and per
/// column (`columns`, the vertical projection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projections {
    pub rows: Vec<u32>,
    pub columns: Vec<u32>,
}

impl Projections {
    pub fn from_edges(edges: &PixelBuffer) -> Self {
        let width = edges.width as usize;
        let height = edges.height as usize;
        let mut rows = vec![0u32; height];
        let mut columns = vec![0u32; width];

        for (y, row) in edges.data.chunks_exact(width.max(1)).enumerate().take(height) {
            for (x, &value) in row.iter().enumerate() {
                if value != 0 {
                    rows[y] += 1;
                    columns[x] += 1;
                }
            }
        }

        Self { rows, columns }
    }
}

/// Direction to scan a projection in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    FromStart,
    FromEnd,
}

/// `max(floor, ratio * max(projection))`.
pub fn projection_threshold(projection: &[u32], config: &DetectionConfig) -> f64 {
    let peak = projection.iter().copied().max().unwrap_or(0) as f64;
    config.projection_floor.max(peak * config.projection_ratio)
}

/// Find the first entry above the dynamic threshold, scanning in `scan`
/// direction, then back off outwards by the safety margin.
///
/// Returns `None` when no entry exceeds the threshold.
pub fn find_boundary(projection: &[u32], scan: Scan, config: &DetectionConfig) -> Option<usize> {
    let threshold = projection_threshold(projection, config);
    let above = |count: &u32| *count as f64 > threshold;

    match scan {
        Scan::FromStart => projection
            .iter()
            .position(above)
            .map(|i| i.saturating_sub(config.safety_margin)),
        Scan::FromEnd => projection
            .iter()
            .rposition(above)
            .map(|i| (i + config.safety_margin).min(projection.len() - 1)),
    }
}

/// Score a candidate in `[0, 1]`.
///
/// * area: peaks when the rectangle covers half the image, 0 outside 20%-80%
/// * border: distance to the nearest image edge, relative to the short side
/// * aspect: favours portrait shapes up to a height/width ratio of 1.4
///
/// Weighted 0.5 / 0.3 / 0.2.
pub fn score_candidate(rect: &Rectangle, image_width: f64, image_height: f64) -> f64 {
    let area_ratio = rect.area() / (image_width * image_height);
    let area_score = if (0.2..=0.8).contains(&area_ratio) {
        1.0 - (area_ratio - 0.5).abs() * 2.0
    } else {
        0.0
    };

    let nearest_border = rect
        .x
        .min(rect.y)
        .min(image_width - rect.right())
        .min(image_height - rect.bottom())
        .max(0.0);
    let border_score = nearest_border / image_width.min(image_height);

    let aspect = if rect.width > 0.0 {
        rect.height / rect.width
    } else {
        0.0
    };
    let aspect_score = if aspect > 1.0 {
        (aspect / 1.4).min(1.0)
    } else {
        aspect
    };

    (area_score * 0.5 + border_score * 0.3 + aspect_score * 0.2).clamp(0.0, 1.0)
}

/// Build the candidate list for an edge map: the projection rectangle (when
/// the four boundaries are consistent) followed by the fallback box.
#[instrument(skip(edges, config), fields(width = edges.width, height = edges.height))]
pub fn candidates(edges: &PixelBuffer, config: &DetectionConfig) -> Result<Vec<CandidateRectangle>> {
    edges.validate()?;
    if edges.layout != ChannelLayout::Gray {
        return Err(ScanError::InvalidImage(
            "boundary location expects a single-channel edge map".into(),
        ));
    }

    let width = edges.width as f64;
    let height = edges.height as f64;
    let projections = Projections::from_edges(edges);
    let mut found = Vec::with_capacity(2);

    let top = find_boundary(&projections.rows, Scan::FromStart, config);
    let bottom = find_boundary(&projections.rows, Scan::FromEnd, config);
    let left = find_boundary(&projections.columns, Scan::FromStart, config);
    let right = find_boundary(&projections.columns, Scan::FromEnd, config);
    debug!(?top, ?bottom, ?left, ?right, "projection boundaries");

    if let (Some(top), Some(bottom), Some(left), Some(right)) = (top, bottom, left, right) {
        if top < bottom && left < right {
            let rectangle =
                Rectangle::from_edges(left as f64, top as f64, right as f64, bottom as f64);
            let score = score_candidate(&rectangle, width, height);
            debug!(?rectangle, score, "projection candidate");
            found.push(CandidateRectangle {
                rectangle,
                score,
                source: CandidateSource::Projection,
            });
        }
    }

    found.push(CandidateRectangle {
        rectangle: Rectangle::centered(&edges.bounds(), config.fallback_coverage),
        score: config.fallback_score,
        source: CandidateSource::Fallback,
    });

    Ok(found)
}

/// Pick the highest-scoring candidate (the earlier one on ties) and clamp it
/// into the image. With no candidates at all, a box with 10% margins on every
/// side is returned.
pub fn select_best(
    candidates: &[CandidateRectangle],
    image_width: u32,
    image_height: u32,
    min_size: f64,
) -> Detection {
    let bounds = Rectangle::new(0.0, 0.0, image_width as f64, image_height as f64);

    let best = candidates.iter().fold(None::<&CandidateRectangle>, |best, c| match best {
        Some(b) if b.score >= c.score => Some(b),
        _ => Some(c),
    });

    match best {
        Some(best) => Detection {
            rectangle: best.rectangle.clamp_within(&bounds, min_size),
            score: best.score,
            source: match best.source {
                CandidateSource::Projection => DetectionSource::Projection,
                CandidateSource::Fallback => DetectionSource::Fallback,
            },
        },
        None => {
            warn!("no document candidates; using default margins");
            Detection {
                rectangle: Rectangle::new(
                    bounds.width * 0.1,
                    bounds.height * 0.1,
                    bounds.width * 0.8,
                    bounds.height * 0.8,
                )
                .clamp_within(&bounds, min_size),
                score: 0.0,
                source: DetectionSource::Default,
            }
        }
    }
}

/// Locate the document rectangle in a binary edge map. The result is at
/// least `config.min_size` natural pixels on each side, or the full extent
/// of a smaller image.
#[instrument(skip(edges, config), fields(width = edges.width, height = edges.height))]
pub fn locate(edges: &PixelBuffer, config: &DetectionConfig) -> Result<Detection> {
    let found = candidates(edges, config)?;
    let detection = select_best(&found, edges.width, edges.height, config.min_size);

    if detection.source != DetectionSource::Projection {
        warn!(source = ?detection.source, "no convincing document edges; starting from default frame");
    }
    info!(
        x = detection.rectangle.x,
        y = detection.rectangle.y,
        width = detection.rectangle.width,
        height = detection.rectangle.height,
        score = detection.score,
        "document boundary located"
    );
    Ok(detection)
}
