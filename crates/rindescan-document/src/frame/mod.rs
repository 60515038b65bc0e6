// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive crop frame: display/natural coordinate mapping, the pointer
// gesture state machine and the preview overlay.

pub mod controller;
pub mod mapping;
pub mod overlay;

pub use controller::{
    CropFrameController, EdgeSet, FrameListener, FrameState, HandleKind, InteractionMode,
    PointerEvent, PointerEventKind, PointerTarget,
};
pub use mapping::CoordinateMapper;
pub use overlay::{OverlayRenderer, OverlayStyle, render_overlay};
