// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop frame interaction state machine: drag, eight-handle resize, clamping
// and change notification, all in display space.

use std::fmt;

use rindescan_core::{Point, Rectangle};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// One of the eight resize handles on the crop frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandleKind {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

/// Which rectangle edges a handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeSet {
    pub left: bool,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
}

impl HandleKind {
    pub const ALL: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::TopRight,
        HandleKind::BottomLeft,
        HandleKind::BottomRight,
        HandleKind::Top,
        HandleKind::Bottom,
        HandleKind::Left,
        HandleKind::Right,
    ];

    pub const fn edges(self) -> EdgeSet {
        let (left, top, right, bottom) = match self {
            HandleKind::TopLeft => (true, true, false, false),
            HandleKind::TopRight => (false, true, true, false),
            HandleKind::BottomLeft => (true, false, false, true),
            HandleKind::BottomRight => (false, false, true, true),
            HandleKind::Top => (false, true, false, false),
            HandleKind::Bottom => (false, false, false, true),
            HandleKind::Left => (true, false, false, false),
            HandleKind::Right => (false, false, true, false),
        };
        EdgeSet {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            HandleKind::TopLeft
                | HandleKind::TopRight
                | HandleKind::BottomLeft
                | HandleKind::BottomRight
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            HandleKind::TopLeft => "top-left",
            HandleKind::TopRight => "top-right",
            HandleKind::BottomLeft => "bottom-left",
            HandleKind::BottomRight => "bottom-right",
            HandleKind::Top => "top",
            HandleKind::Bottom => "bottom",
            HandleKind::Left => "left",
            HandleKind::Right => "right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.name() == name)
    }

    /// Centre of this handle on `frame`.
    pub fn position(self, frame: &Rectangle) -> Point {
        let edges = self.edges();
        let x = if edges.left {
            frame.x
        } else if edges.right {
            frame.right()
        } else {
            frame.x + frame.width / 2.0
        };
        let y = if edges.top {
            frame.y
        } else if edges.bottom {
            frame.bottom()
        } else {
            frame.y + frame.height / 2.0
        };
        Point::new(x, y)
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Pointer events
// ---------------------------------------------------------------------------

/// What a pointer landed on when it went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTarget {
    DragArea,
    Handle(HandleKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Down(PointerTarget),
    Move,
    Up,
    Cancel,
}

/// A pointer (mouse or touch) event in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub position: Point,
    pub kind: PointerEventKind,
}

impl PointerEvent {
    pub fn down(pointer_id: u32, position: Point, target: PointerTarget) -> Self {
        Self {
            pointer_id,
            position,
            kind: PointerEventKind::Down(target),
        }
    }

    pub fn moved(pointer_id: u32, position: Point) -> Self {
        Self {
            pointer_id,
            position,
            kind: PointerEventKind::Move,
        }
    }

    pub fn up(pointer_id: u32, position: Point) -> Self {
        Self {
            pointer_id,
            position,
            kind: PointerEventKind::Up,
        }
    }

    pub fn cancel(pointer_id: u32, position: Point) -> Self {
        Self {
            pointer_id,
            position,
            kind: PointerEventKind::Cancel,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging,
    Resizing(HandleKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize(HandleKind),
}

/// Pointer position and frame at the moment the gesture started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pointer: Point,
    pub rectangle: Rectangle,
}

/// An active drag or resize, owned by exactly one pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub pointer_id: u32,
    pub kind: GestureKind,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub rectangle: Rectangle,
    pub gesture: Option<Gesture>,
}

impl FrameState {
    pub fn mode(&self) -> InteractionMode {
        match self.gesture.map(|g| g.kind) {
            None => InteractionMode::Idle,
            Some(GestureKind::Drag) => InteractionMode::Dragging,
            Some(GestureKind::Resize(handle)) => InteractionMode::Resizing(handle),
        }
    }
}

/// Receives the frame rectangle, in display space, every time it changes.
pub trait FrameListener {
    fn frame_changed(&mut self, frame: &Rectangle);
}

impl<F> FrameListener for F
where
    F: FnMut(&Rectangle),
{
    fn frame_changed(&mut self, frame: &Rectangle) {
        self(frame)
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the crop frame and applies pointer gestures to it.
///
/// The frame always lies inside `bounds` and is at least `min_size` on each
/// side (or as large as `bounds` allows). Listeners hear about every move of
/// an active gesture and every programmatic change.
pub struct CropFrameController {
    state: FrameState,
    bounds: Rectangle,
    min_size: f64,
    listeners: Vec<Box<dyn FrameListener>>,
}

impl fmt::Debug for CropFrameController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CropFrameController")
            .field("state", &self.state)
            .field("bounds", &self.bounds)
            .field("min_size", &self.min_size)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CropFrameController {
    pub fn new(initial: Rectangle, bounds: Rectangle, min_size: f64) -> Self {
        Self {
            state: FrameState {
                rectangle: initial.clamp_within(&bounds, min_size),
                gesture: None,
            },
            bounds,
            min_size,
            listeners: Vec::new(),
        }
    }

    pub fn rectangle(&self) -> Rectangle {
        self.state.rectangle
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode()
    }

    pub fn is_idle(&self) -> bool {
        self.state.gesture.is_none()
    }

    pub fn add_listener(&mut self, listener: impl FrameListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Hit-test a display point against the frame. Handles win over the
    /// drag area, corners over edge midpoints.
    pub fn target_at(&self, point: Point, tolerance: f64) -> Option<PointerTarget> {
        let frame = &self.state.rectangle;
        let near = |p: Point| (p.x - point.x).abs() <= tolerance && (p.y - point.y).abs() <= tolerance;

        let corners = HandleKind::ALL.into_iter().filter(|h| h.is_corner());
        let sides = HandleKind::ALL.into_iter().filter(|h| !h.is_corner());
        if let Some(handle) = corners.chain(sides).find(|h| near(h.position(frame))) {
            return Some(PointerTarget::Handle(handle));
        }

        let inside = point.x >= frame.x
            && point.x <= frame.right()
            && point.y >= frame.y
            && point.y <= frame.bottom();
        inside.then_some(PointerTarget::DragArea)
    }

    /// Feed one pointer event through the state machine. Returns whether the
    /// event was consumed.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        match (event.kind, self.state.gesture) {
            (PointerEventKind::Down(target), None) => {
                let kind = match target {
                    PointerTarget::DragArea => GestureKind::Drag,
                    PointerTarget::Handle(handle) => GestureKind::Resize(handle),
                };
                self.state.gesture = Some(Gesture {
                    pointer_id: event.pointer_id,
                    kind,
                    anchor: Anchor {
                        pointer: event.position,
                        rectangle: self.state.rectangle,
                    },
                });
                debug!(pointer = event.pointer_id, ?kind, "gesture started");
                true
            }
            (PointerEventKind::Down(_), Some(active)) => {
                debug!(
                    pointer = event.pointer_id,
                    active = active.pointer_id,
                    "pointer down ignored while a gesture is active"
                );
                false
            }
            (_, Some(active)) if active.pointer_id != event.pointer_id => {
                warn!(
                    pointer = event.pointer_id,
                    active = active.pointer_id,
                    "event from a pointer that does not own the gesture"
                );
                false
            }
            (PointerEventKind::Move, Some(active)) => {
                let delta = event.position.offset_from(active.anchor.pointer);
                self.state.rectangle = match active.kind {
                    GestureKind::Drag => self.dragged(&active.anchor, delta),
                    GestureKind::Resize(handle) => self.resized(&active.anchor, handle, delta),
                };
                self.publish();
                true
            }
            (PointerEventKind::Up | PointerEventKind::Cancel, Some(active)) => {
                self.state.gesture = None;
                debug!(pointer = active.pointer_id, frame = ?self.state.rectangle, "gesture ended");
                true
            }
            (_, None) => false,
        }
    }

    /// Replace the frame from outside a gesture, e.g. a reset or a
    /// re-applied detection. Ignored while a gesture is active.
    #[instrument(skip(self))]
    pub fn set_rectangle(&mut self, rectangle: Rectangle) -> bool {
        if !self.is_idle() {
            debug!("frame update ignored during an active gesture");
            return false;
        }
        self.state.rectangle = rectangle.clamp_within(&self.bounds, self.min_size);
        self.publish();
        true
    }

    /// Adopt new container bounds after a layout change. Any active gesture
    /// is dropped since its anchor belongs to the old layout.
    #[instrument(skip(self))]
    pub fn relayout(&mut self, bounds: Rectangle, frame: Rectangle) {
        if self.state.gesture.take().is_some() {
            debug!("active gesture dropped by relayout");
        }
        self.bounds = bounds;
        self.state.rectangle = frame.clamp_within(&bounds, self.min_size);
        self.publish();
    }

    fn dragged(&self, anchor: &Anchor, delta: Point) -> Rectangle {
        anchor
            .rectangle
            .translate(delta.x, delta.y)
            .clamp_within(&self.bounds, self.min_size)
    }

    /// Move the edges the handle owns. Each moving edge stops at the
    /// container and at `min_size` from the opposite edge, so the edges the
    /// handle does not own stay put.
    fn resized(&self, anchor: &Anchor, handle: HandleKind, delta: Point) -> Rectangle {
        let start = &anchor.rectangle;
        let bounds = &self.bounds;
        let min = self.min_size;
        let edges = handle.edges();

        let mut left = start.x;
        let mut top = start.y;
        let mut right = start.right();
        let mut bottom = start.bottom();

        if edges.left {
            left = (start.x + delta.x).min(right - min).max(bounds.x);
        }
        if edges.right {
            right = (start.right() + delta.x).max(left + min).min(bounds.right());
        }
        if edges.top {
            top = (start.y + delta.y).min(bottom - min).max(bounds.y);
        }
        if edges.bottom {
            bottom = (start.bottom() + delta.y).max(top + min).min(bounds.bottom());
        }

        Rectangle::from_edges(left, top, right, bottom).clamp_within(bounds, min)
    }

    fn publish(&mut self) {
        let frame = self.state.rectangle;
        for listener in &mut self.listeners {
            listener.frame_changed(&frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const BOUNDS: Rectangle = Rectangle {
        x: 0.0,
        y: 0.0,
        width: 400.0,
        height: 300.0,
    };

    fn controller() -> CropFrameController {
        CropFrameController::new(Rectangle::new(100.0, 100.0, 200.0, 100.0), BOUNDS, 50.0)
    }

    fn gesture(c: &mut CropFrameController, target: PointerTarget, from: Point, to: Point) {
        assert!(c.handle_event(PointerEvent::down(1, from, target)));
        assert!(c.handle_event(PointerEvent::moved(1, to)));
        assert!(c.handle_event(PointerEvent::up(1, to)));
    }

    #[test]
    fn drag_inside_bounds_translates_exactly() {
        let mut c = controller();
        gesture(&mut c, PointerTarget::DragArea, Point::new(150.0, 150.0), Point::new(180.0, 130.0));
        assert_eq!(c.rectangle(), Rectangle::new(130.0, 80.0, 200.0, 100.0));
        assert!(c.is_idle());
    }

    #[test]
    fn drag_is_clamped_to_container() {
        let mut c = controller();
        gesture(&mut c, PointerTarget::DragArea, Point::new(150.0, 150.0), Point::new(900.0, -900.0));
        assert_eq!(c.rectangle(), Rectangle::new(200.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn top_left_resize_keeps_bottom_right_fixed() {
        let mut c = controller();
        let handle = PointerTarget::Handle(HandleKind::TopLeft);

        gesture(&mut c, handle, Point::new(100.0, 100.0), Point::new(80.0, 70.0));
        assert_eq!(c.rectangle(), Rectangle::new(80.0, 70.0, 220.0, 130.0));

        // Far past the opposite corner: stops at the minimum size.
        gesture(&mut c, handle, Point::new(80.0, 70.0), Point::new(1000.0, 1000.0));
        let r = c.rectangle();
        assert_eq!(r, Rectangle::new(250.0, 150.0, 50.0, 50.0));

        // Far outside the container: stops at the container edge.
        gesture(&mut c, handle, Point::new(250.0, 150.0), Point::new(-1000.0, -1000.0));
        let r = c.rectangle();
        assert_eq!((r.x, r.y, r.right(), r.bottom()), (0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn each_handle_moves_only_its_own_edges() {
        for handle in HandleKind::ALL {
            let mut c = controller();
            let before = c.rectangle();
            let start = handle.position(&before);
            gesture(
                &mut c,
                PointerTarget::Handle(handle),
                start,
                Point::new(start.x + 10.0, start.y + 10.0),
            );
            let after = c.rectangle();
            let edges = handle.edges();
            assert_eq!(after.x != before.x, edges.left, "{handle} left");
            assert_eq!(after.y != before.y, edges.top, "{handle} top");
            assert_eq!(after.right() != before.right(), edges.right, "{handle} right");
            assert_eq!(after.bottom() != before.bottom(), edges.bottom, "{handle} bottom");
        }
    }

    #[test]
    fn every_gesture_respects_minimum_and_bounds() {
        let deltas = [(-5000.0, -5000.0), (5000.0, 5000.0), (-5000.0, 5000.0), (5000.0, -5000.0)];
        let targets = HandleKind::ALL
            .into_iter()
            .map(PointerTarget::Handle)
            .chain([PointerTarget::DragArea]);
        for target in targets {
            for (dx, dy) in deltas {
                let mut c = controller();
                let from = Point::new(150.0, 150.0);
                gesture(&mut c, target, from, Point::new(from.x + dx, from.y + dy));
                let r = c.rectangle();
                assert!(r.width >= 50.0 && r.height >= 50.0, "{target:?} {r:?}");
                assert!(r.is_within(&BOUNDS), "{target:?} {r:?}");
            }
        }
    }

    #[test]
    fn second_pointer_cannot_interfere() {
        let mut c = controller();
        assert!(c.handle_event(PointerEvent::down(1, Point::new(150.0, 150.0), PointerTarget::DragArea)));

        // A second finger landing on a handle is ignored.
        let other = PointerTarget::Handle(HandleKind::Right);
        assert!(!c.handle_event(PointerEvent::down(2, Point::new(300.0, 150.0), other)));
        assert!(!c.handle_event(PointerEvent::moved(2, Point::new(350.0, 150.0))));
        assert!(!c.handle_event(PointerEvent::up(2, Point::new(350.0, 150.0))));
        assert_eq!(c.mode(), InteractionMode::Dragging);
        assert_eq!(c.rectangle(), Rectangle::new(100.0, 100.0, 200.0, 100.0));

        assert!(c.handle_event(PointerEvent::moved(1, Point::new(160.0, 150.0))));
        assert_eq!(c.rectangle().x, 110.0);
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let mut c = controller();
        assert!(!c.handle_event(PointerEvent::moved(1, Point::new(0.0, 0.0))));
        assert!(!c.handle_event(PointerEvent::up(1, Point::new(0.0, 0.0))));
        assert_eq!(c.rectangle(), Rectangle::new(100.0, 100.0, 200.0, 100.0));
    }

    #[test]
    fn cancel_keeps_last_rectangle() {
        let mut c = controller();
        c.handle_event(PointerEvent::down(7, Point::new(300.0, 200.0), PointerTarget::Handle(HandleKind::BottomRight)));
        assert_eq!(c.mode(), InteractionMode::Resizing(HandleKind::BottomRight));
        c.handle_event(PointerEvent::moved(7, Point::new(320.0, 230.0)));
        assert!(c.handle_event(PointerEvent::cancel(7, Point::new(320.0, 230.0))));
        assert!(c.is_idle());
        assert_eq!(c.rectangle(), Rectangle::new(100.0, 100.0, 220.0, 130.0));
    }

    #[test]
    fn listeners_hear_every_move() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut c = controller();
        c.add_listener(move |frame: &Rectangle| sink.borrow_mut().push(*frame));

        c.handle_event(PointerEvent::down(1, Point::new(150.0, 150.0), PointerTarget::DragArea));
        for step in 1..=3 {
            c.handle_event(PointerEvent::moved(1, Point::new(150.0 + step as f64, 150.0)));
        }
        // Repeated position still republishes.
        c.handle_event(PointerEvent::moved(1, Point::new(153.0, 150.0)));
        c.handle_event(PointerEvent::up(1, Point::new(153.0, 150.0)));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0].x, 101.0);
        assert_eq!(seen[3].x, 103.0);
    }

    #[test]
    fn set_rectangle_waits_for_idle() {
        let mut c = controller();
        c.handle_event(PointerEvent::down(1, Point::new(150.0, 150.0), PointerTarget::DragArea));
        assert!(!c.set_rectangle(Rectangle::new(0.0, 0.0, 60.0, 60.0)));
        c.handle_event(PointerEvent::up(1, Point::new(150.0, 150.0)));

        assert!(c.set_rectangle(Rectangle::new(-10.0, 0.0, 10.0, 500.0)));
        assert_eq!(c.rectangle(), Rectangle::new(0.0, 0.0, 50.0, 300.0));
    }

    #[test]
    fn relayout_drops_gesture_and_reclamps() {
        let mut c = controller();
        c.handle_event(PointerEvent::down(1, Point::new(150.0, 150.0), PointerTarget::DragArea));
        c.relayout(
            Rectangle::new(0.0, 0.0, 200.0, 150.0),
            Rectangle::new(50.0, 50.0, 100.0, 50.0),
        );
        assert!(c.is_idle());
        assert_eq!(c.rectangle(), Rectangle::new(50.0, 50.0, 100.0, 50.0));
        assert_eq!(c.bounds(), Rectangle::new(0.0, 0.0, 200.0, 150.0));
    }

    #[test]
    fn hit_testing_prefers_handles() {
        let c = controller();
        assert_eq!(
            c.target_at(Point::new(102.0, 98.0), 10.0),
            Some(PointerTarget::Handle(HandleKind::TopLeft))
        );
        assert_eq!(
            c.target_at(Point::new(200.0, 195.0), 10.0),
            Some(PointerTarget::Handle(HandleKind::Bottom))
        );
        assert_eq!(c.target_at(Point::new(150.0, 150.0), 10.0), Some(PointerTarget::DragArea));
        assert_eq!(c.target_at(Point::new(20.0, 20.0), 10.0), None);
    }

    #[test]
    fn handle_names_round_trip() {
        for handle in HandleKind::ALL {
            assert_eq!(HandleKind::from_name(handle.name()), Some(handle));
        }
        assert_eq!(HandleKind::from_name("middle"), None);
    }

    #[test]
    fn pointer_events_deserialize_from_ui_json() {
        let json = r#"{
            "pointer_id": 3,
            "position": { "x": 12.5, "y": 40.0 },
            "kind": { "down": { "handle": "bottom-left" } }
        }"#;
        let event: PointerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            PointerEvent::down(
                3,
                Point::new(12.5, 40.0),
                PointerTarget::Handle(HandleKind::BottomLeft)
            )
        );

        let moved: PointerEvent =
            serde_json::from_str(r#"{"pointer_id":3,"position":{"x":1.0,"y":2.0},"kind":"move"}"#)
                .unwrap();
        assert_eq!(moved.kind, PointerEventKind::Move);
    }
}
