// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Final crop extraction and output encoding.

pub mod cropper;

pub use cropper::{EncodedImage, compress, crop};
