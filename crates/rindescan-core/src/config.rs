// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Settings for the whole crop engine. Every section falls back to its
/// defaults when missing from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detection: DetectionConfig,
    pub frame: FrameConfig,
    pub compression: CompressionConfig,
}

/// Edge detection and boundary location tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sobel magnitude a pixel must exceed to count as an edge.
    pub edge_threshold: f64,
    /// Lower bound of the projection threshold, in edge pixels.
    pub projection_floor: f64,
    /// Projection threshold as a fraction of the strongest row/column.
    pub projection_ratio: f64,
    /// Pixels to back off from a detected boundary so the paper edge survives.
    pub safety_margin: usize,
    /// Fraction of each image side covered by the fallback box.
    pub fallback_coverage: f64,
    /// Fixed score given to the fallback box.
    pub fallback_score: f64,
    /// Smallest side of a located or externally supplied rectangle, in
    /// natural pixels.
    pub min_size: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 40.0,
            projection_floor: 5.0,
            projection_ratio: 0.1,
            safety_margin: 10,
            fallback_coverage: 0.75,
            fallback_score: 0.5,
            min_size: crate::MIN_SIZE,
        }
    }
}

/// Interactive crop frame limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Smallest frame side in display pixels.
    pub min_size: f64,
    /// Coverage of the box restored by "reset frame".
    pub reset_coverage: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            min_size: crate::MIN_SIZE,
            reset_coverage: 0.75,
        }
    }
}

/// Re-encode settings applied to the cropped image before upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Longest allowed side in pixels; `None` keeps the cropped size.
    pub max_dimension: Option<u32>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            max_dimension: Some(2000),
        }
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(ScanError::Config(format!(
                "quality must be within 1-100, got {}",
                self.quality
            )));
        }
        if self.max_dimension == Some(0) {
            return Err(ScanError::Config("max_dimension must be positive".into()));
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Parse a JSON document, filling gaps with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if !(d.edge_threshold.is_finite() && d.edge_threshold >= 0.0) {
            return Err(ScanError::Config(format!(
                "edge_threshold must be a non-negative number, got {}",
                d.edge_threshold
            )));
        }
        if !(0.0..=1.0).contains(&d.projection_ratio) {
            return Err(ScanError::Config(format!(
                "projection_ratio must be within [0, 1], got {}",
                d.projection_ratio
            )));
        }
        if !(d.fallback_coverage > 0.0 && d.fallback_coverage <= 1.0) {
            return Err(ScanError::Config(format!(
                "fallback_coverage must be within (0, 1], got {}",
                d.fallback_coverage
            )));
        }
        if !(0.0..=1.0).contains(&d.fallback_score) {
            return Err(ScanError::Config(format!(
                "fallback_score must be within [0, 1], got {}",
                d.fallback_score
            )));
        }
        if !(d.min_size.is_finite() && d.min_size > 0.0) {
            return Err(ScanError::Config(format!(
                "detection min_size must be positive, got {}",
                d.min_size
            )));
        }
        if !(self.frame.min_size.is_finite() && self.frame.min_size > 0.0) {
            return Err(ScanError::Config(format!(
                "min_size must be positive, got {}",
                self.frame.min_size
            )));
        }
        if !(self.frame.reset_coverage > 0.0 && self.frame.reset_coverage <= 1.0) {
            return Err(ScanError::Config(format!(
                "reset_coverage must be within (0, 1], got {}",
                self.frame.reset_coverage
            )));
        }
        self.compression.validate()
    }
}
