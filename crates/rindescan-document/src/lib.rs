// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rindescan-document: Document boundary detection and interactive crop
// correction.
//
// Finds the page in a captured photo (grayscale, smoothing, Sobel edges,
// projection profiles), lets the user correct the frame with pointer
// gestures in display space, and crops the original at full resolution.

pub mod crop;
pub mod detect;
pub mod frame;
pub mod session;

// Re-export the primary entry points so callers can use `rindescan_document::CropSession` etc.
pub use crop::{EncodedImage, compress, crop};
pub use detect::detect_document;
pub use frame::{
    CoordinateMapper, CropFrameController, FrameListener, HandleKind, OverlayRenderer,
    OverlayStyle, PointerEvent, PointerTarget,
};
pub use session::{CropOutcome, CropSession};
