//! NavTree DragDrop Utilities
//!
//! Framework-agnostic drag-and-drop for tree sidebars.
//! Uses movement threshold to distinguish click from drag, and a
//! swappable proximity strategy to rank drop candidates.

mod proximity;

pub use proximity::{ClosestCenter, Collision, PointerWithin, Proximity};

use serde::{Deserialize, Serialize};

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Pointer position in viewport coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned bounding box (matches DomRect fields)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && self.contains_y(p.y)
    }

    /// Vertical containment only. Sidebar rows span the full width, so the
    /// y coordinate alone decides which band the pointer is in.
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y <= self.bottom()
    }
}

/// A registered drop target and its last measured rect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Droppable {
    pub id: String,
    pub rect: Rect,
}

impl Droppable {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self { id: id.into(), rect }
    }
}

/// Events produced by the sensor, in delivery order:
/// `Started` once, `Moved` any number of times, then `Dropped` or `Cancelled`.
#[derive(Clone, Debug, PartialEq)]
pub enum SensorEvent {
    Started { id: String, pointer: Point },
    Moved { id: String, pointer: Point },
    Dropped { id: String, pointer: Point },
    Cancelled { id: String },
    /// Pressed and released without crossing the threshold
    Clicked { id: String },
}

/// Pointer sensor state machine.
///
/// A press only records a pending drag; dragging starts once the pointer
/// moves more than `threshold` pixels on either axis.
#[derive(Clone, Debug)]
pub struct PointerSensor {
    threshold: f64,
    /// Pending item id (pressed but not yet dragging) and start position
    pending: Option<(String, Point)>,
    dragging: Option<String>,
}

impl Default for PointerSensor {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD_PX)
    }
}

impl PointerSensor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            pending: None,
            dragging: None,
        }
    }

    /// Currently dragged id, if the threshold has been crossed
    pub fn dragging_id(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Record pending drag with start position
    pub fn pointer_down(&mut self, id: impl Into<String>, at: Point) {
        self.dragging = None;
        self.pending = Some((id.into(), at));
    }

    /// Start dragging if moved enough; report movement while dragging
    pub fn pointer_move(&mut self, at: Point) -> Option<SensorEvent> {
        if let Some(id) = &self.dragging {
            return Some(SensorEvent::Moved {
                id: id.clone(),
                pointer: at,
            });
        }

        let (id, start) = self.pending.as_ref()?;
        let dx = (at.x - start.x).abs();
        let dy = (at.y - start.y).abs();
        if dx > self.threshold || dy > self.threshold {
            let id = id.clone();
            self.pending = None;
            self.dragging = Some(id.clone());
            return Some(SensorEvent::Started { id, pointer: at });
        }
        None
    }

    /// End the gesture. Clear pending state first, then decide drop vs click.
    pub fn pointer_up(&mut self, at: Point) -> Option<SensorEvent> {
        let pending = self.pending.take();
        if let Some(id) = self.dragging.take() {
            return Some(SensorEvent::Dropped { id, pointer: at });
        }
        pending.map(|(id, _)| SensorEvent::Clicked { id })
    }

    /// Abort (e.g. Escape). Only an active drag produces an event.
    pub fn cancel(&mut self) -> Option<SensorEvent> {
        self.pending = None;
        self.dragging.take().map(|id| SensorEvent::Cancelled { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_below_threshold() {
        let mut sensor = PointerSensor::default();
        sensor.pointer_down("ref:7", Point::new(10.0, 10.0));
        assert_eq!(sensor.pointer_move(Point::new(13.0, 14.0)), None);
        assert!(!sensor.is_dragging());
        assert_eq!(
            sensor.pointer_up(Point::new(13.0, 14.0)),
            Some(SensorEvent::Clicked { id: "ref:7".to_string() })
        );
    }

    #[test]
    fn test_drag_lifecycle() {
        let mut sensor = PointerSensor::new(5.0);
        sensor.pointer_down("ref:7", Point::new(0.0, 0.0));

        let started = sensor.pointer_move(Point::new(0.0, 6.0));
        assert!(matches!(started, Some(SensorEvent::Started { ref id, .. }) if id == "ref:7"));
        assert_eq!(sensor.dragging_id(), Some("ref:7"));

        let moved = sensor.pointer_move(Point::new(1.0, 40.0));
        assert!(matches!(moved, Some(SensorEvent::Moved { pointer, .. }) if pointer.y == 40.0));

        let dropped = sensor.pointer_up(Point::new(1.0, 41.0));
        assert!(matches!(dropped, Some(SensorEvent::Dropped { ref id, .. }) if id == "ref:7"));
        assert!(!sensor.is_dragging());
        assert_eq!(sensor.pointer_up(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_cancel_only_reports_active_drag() {
        let mut sensor = PointerSensor::default();
        sensor.pointer_down("group:g1", Point::default());
        assert_eq!(sensor.cancel(), None);

        sensor.pointer_down("group:g1", Point::default());
        sensor.pointer_move(Point::new(20.0, 0.0));
        assert_eq!(
            sensor.cancel(),
            Some(SensorEvent::Cancelled { id: "group:g1".to_string() })
        );
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut sensor = PointerSensor::default();
        assert_eq!(sensor.pointer_move(Point::new(100.0, 100.0)), None);
    }

    #[test]
    fn test_rect_containment() {
        let rect = Rect::new(0.0, 100.0, 200.0, 50.0);
        assert!(rect.contains_y(100.0));
        assert!(rect.contains_y(150.0));
        assert!(!rect.contains_y(150.5));
        assert!(rect.contains(Point::new(10.0, 120.0)));
        assert!(!rect.contains(Point::new(250.0, 120.0)));
        assert_eq!(rect.center(), Point::new(100.0, 125.0));
    }
}
