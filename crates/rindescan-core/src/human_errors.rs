// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for drivers and fleet staff scanning forms.
//
// Every technical error is mapped to a plain message with a clear suggestion.
// Severity drives how the surrounding UI presents it.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying the same thing again may work.
    Transient,
    /// The user must do something (retake the photo, widen the frame).
    ActionRequired,
    /// Retrying will not help; the input or setup is wrong.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the caller may simply retry.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanError` into something a driver can act on.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::InvalidImage(detail) if detail.contains("decode") => HumanError {
            message: "We couldn't open this photo.".into(),
            suggestion: "The file may be damaged or in an unusual format. Take the photo again or pick a JPEG or PNG.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::InvalidImage(_) => HumanError {
            message: "This photo can't be processed.".into(),
            suggestion: "The image is empty or incomplete. Please take the photo again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::DegenerateRegion { .. } => HumanError {
            message: "The selected area is too small.".into(),
            suggestion: "Drag the corners of the frame outwards so it covers the whole form, then confirm again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::InvalidMapping(_) => HumanError {
            message: "The crop editor lost track of the photo on screen.".into(),
            suggestion: "Close the editor and open it again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::Encoding(_) => HumanError {
            message: "We couldn't prepare the cropped form for upload.".into(),
            suggestion: "Try confirming the crop again. If this keeps happening, retake the photo.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::Config(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Ask your administrator to check the scanner configuration. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => HumanError {
            message: "The scanner settings file couldn't be found.".into(),
            suggestion: "Default settings will be used until the file is restored.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::Io(_) => HumanError {
            message: "There was a problem reading the scanner settings.".into(),
            suggestion: "Try again. If this keeps happening, check the device storage.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanError::Serialization(_) => HumanError {
            message: "The scanner settings file is damaged.".into(),
            suggestion: "Ask your administrator to fix or replace the configuration file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
