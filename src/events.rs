//! Generic event system for the plotting engine.
//!
//! Host code can subscribe to capture and editing activity via
//! [`EventController`]. Each event carries a set of [`EventKind`] flags
//! (bitflags-style) so that a single occurrence can match multiple
//! categories (e.g. a double-click that completes a product is both a
//! `DOUBLE_CLICK` and a `PRODUCT_COMPLETED` event).
//!
//! Subscribers specify an [`EventFilter`] to receive only the events they
//! care about. The filter is a simple OR mask: an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::geom::{ScreenPos, WorldPos};
use crate::product::{ProductId, Status};
use crate::skeleton::HandleFamily;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the *categories* an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Pointer / gesture ────────────────────────────────────────────────
    /// A single (primary) click handled by the controller.
    pub const CLICK: Self = Self(1 << 0);
    /// A double-click (force completion gesture).
    pub const DOUBLE_CLICK: Self = Self(1 << 1);
    /// A right-click (undo gesture).
    pub const RIGHT_CLICK: Self = Self(1 << 2);

    // ── Capture mutations ───────────────────────────────────────────────
    /// A point was appended to the defining product.
    pub const POINT_APPENDED: Self = Self(1 << 3);
    /// The most recent point was removed (right-click undo).
    pub const POINT_REMOVED: Self = Self(1 << 4);
    /// An interval handle materialized a new interior point.
    pub const POINT_INSERTED: Self = Self(1 << 5);
    /// Points were moved by a drag or a keyboard nudge.
    pub const POINT_MOVED: Self = Self(1 << 6);

    // ── Product lifecycle ───────────────────────────────────────────────
    /// A new capture session started.
    pub const PRODUCT_STARTED: Self = Self(1 << 7);
    /// A product's completion predicate fired; it is now active.
    pub const PRODUCT_COMPLETED: Self = Self(1 << 8);
    /// An in-progress product was discarded.
    pub const PRODUCT_CANCELLED: Self = Self(1 << 9);
    /// A product became the current (edited) one.
    pub const PRODUCT_SELECTED: Self = Self(1 << 10);
    /// The current product was deselected.
    pub const PRODUCT_DESELECTED: Self = Self(1 << 11);
    /// A product's status changed (any transition).
    pub const STATUS_CHANGED: Self = Self(1 << 12);

    // ── Handle editing ──────────────────────────────────────────────────
    /// A skeleton-handle drag started.
    pub const DRAG_STARTED: Self = Self(1 << 13);
    /// A skeleton-handle drag ended.
    pub const DRAG_ENDED: Self = Self(1 << 14);
    /// A selected control point was nudged by the keyboard.
    pub const KEY_NUDGE: Self = Self(1 << 15);

    // ── Rendering ───────────────────────────────────────────────────────
    /// A product's drawables were recomputed and pushed to the scene.
    pub const RENDERED: Self = Self(1 << 16);

    /// Wildcard: matches *every* event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Combine two event kinds (bitwise OR).
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::Not for EventKind {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// String conversions
// ─────────────────────────────────────────────────────────────────────────────

const KIND_NAMES: &[(EventKind, &str)] = &[
    (EventKind::CLICK, "CLICK"),
    (EventKind::DOUBLE_CLICK, "DOUBLE_CLICK"),
    (EventKind::RIGHT_CLICK, "RIGHT_CLICK"),
    (EventKind::POINT_APPENDED, "POINT_APPENDED"),
    (EventKind::POINT_REMOVED, "POINT_REMOVED"),
    (EventKind::POINT_INSERTED, "POINT_INSERTED"),
    (EventKind::POINT_MOVED, "POINT_MOVED"),
    (EventKind::PRODUCT_STARTED, "PRODUCT_STARTED"),
    (EventKind::PRODUCT_COMPLETED, "PRODUCT_COMPLETED"),
    (EventKind::PRODUCT_CANCELLED, "PRODUCT_CANCELLED"),
    (EventKind::PRODUCT_SELECTED, "PRODUCT_SELECTED"),
    (EventKind::PRODUCT_DESELECTED, "PRODUCT_DESELECTED"),
    (EventKind::STATUS_CHANGED, "STATUS_CHANGED"),
    (EventKind::DRAG_STARTED, "DRAG_STARTED"),
    (EventKind::DRAG_ENDED, "DRAG_ENDED"),
    (EventKind::KEY_NUDGE, "KEY_NUDGE"),
    (EventKind::RENDERED, "RENDERED"),
];

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in KIND_NAMES {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }

        if names.is_empty() {
            write!(f, "0x{:x}", self.0)
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata – per-event-type payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata attached to pointer events.
#[derive(Debug, Clone, Copy)]
pub struct PointerMeta {
    /// Screen coordinates of the pointer.
    pub screen: Option<ScreenPos>,
    /// World position the pointer resolved to (if projection succeeded).
    pub world: Option<WorldPos>,
}

/// Metadata identifying the product an event concerns.
#[derive(Debug, Clone)]
pub struct ProductMeta {
    pub product: ProductId,
    /// Type name of the product's scheme.
    pub scheme_type: String,
    /// Status after the event (for lifecycle/status events).
    pub status: Option<Status>,
}

/// Metadata for capture-point mutations.
#[derive(Debug, Clone, Copy)]
pub struct PointMeta {
    /// Index of the affected point.
    pub index: usize,
    /// Its position after the mutation (absent for removals).
    pub position: Option<WorldPos>,
    /// Captured point count after the mutation.
    pub count: usize,
}

/// Metadata for skeleton-handle drags.
#[derive(Debug, Clone, Copy)]
pub struct DragMeta {
    pub family: HandleFamily,
    /// Handle index within its family.
    pub index: usize,
    /// Point index materialized by an interval drag (once inserted).
    pub inserted_at: Option<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// PlotEvent – the top-level event type
// ─────────────────────────────────────────────────────────────────────────────

/// A rich event emitted by the plotting engine.
///
/// `kinds` is a bitflag set of [`EventKind`] categories. The `Option<…Meta>`
/// fields carry metadata relevant to the kinds that are set.
#[derive(Debug, Clone)]
pub struct PlotEvent {
    /// Bitflag set of categories this event belongs to.
    pub kinds: EventKind,
    /// Monotonic timestamp (seconds since controller start).
    pub timestamp: f64,

    pub pointer: Option<PointerMeta>,
    pub product: Option<ProductMeta>,
    pub point: Option<PointMeta>,
    pub drag: Option<DragMeta>,
}

impl PlotEvent {
    /// Create a new event with the given kinds; the timestamp is set on emit.
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0,
            pointer: None,
            product: None,
            point: None,
            drag: None,
        }
    }

    pub fn with_pointer(mut self, meta: PointerMeta) -> Self {
        self.pointer = Some(meta);
        self
    }

    pub fn with_product(mut self, meta: ProductMeta) -> Self {
        self.product = Some(meta);
        self
    }

    pub fn with_point(mut self, meta: PointMeta) -> Self {
        self.point = Some(meta);
        self
    }

    pub fn with_drag(mut self, meta: DragMeta) -> Self {
        self.drag = Some(meta);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// A filter that selects which event categories a subscriber receives.
///
/// The filter is an OR-mask: an event is delivered when
/// `event.kinds.intersects(filter.mask)`.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    /// Accept all events.
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    /// Accept only the specified event kinds.
    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    /// Check whether an event passes this filter.
    #[inline]
    pub fn matches(&self, event: &PlotEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<PlotEvent>,
}

/// Collects and distributes engine events to subscribers.
///
/// Obtain it from [`PlotController::events`](crate::controller::PlotController::events)
/// and call [`subscribe`](Self::subscribe) (with an optional filter) to
/// receive events on an `mpsc` channel.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    /// Create a new event controller.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<PlotEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    /// Subscribe to *all* events (no filtering).
    pub fn subscribe_all(&self) -> Receiver<PlotEvent> {
        self.subscribe(EventFilter::all())
    }

    /// Emit an event to all matching subscribers.
    ///
    /// Called internally by the engine; public so embedding code can inject
    /// synthetic events. Subscribers whose channel has closed are pruned.
    pub fn emit(&self, mut event: PlotEvent) {
        let mut inner = self.inner.lock().unwrap();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_union_and_intersection() {
        let click = EventKind::CLICK;
        let dbl = EventKind::DOUBLE_CLICK;
        let combined = click | dbl;
        assert!(combined.contains(click));
        assert!(combined.contains(dbl));
        assert!(combined.intersects(click));
        assert!(!EventKind::RENDERED.intersects(click));
    }

    #[test]
    fn event_kind_all_matches_everything() {
        assert!(EventKind::ALL.contains(EventKind::CLICK));
        assert!(EventKind::ALL.contains(EventKind::PRODUCT_COMPLETED));
        assert!(EventKind::ALL.contains(EventKind::KEY_NUDGE));
    }

    #[test]
    fn event_filter_matches() {
        let filter = EventFilter::only(EventKind::CLICK | EventKind::DOUBLE_CLICK);
        let evt = PlotEvent::new(EventKind::CLICK);
        assert!(filter.matches(&evt));

        let evt2 = PlotEvent::new(EventKind::RENDERED);
        assert!(!filter.matches(&evt2));

        let evt3 = PlotEvent::new(EventKind::CLICK | EventKind::POINT_APPENDED);
        assert!(filter.matches(&evt3));
    }

    #[test]
    fn event_controller_subscribe_and_emit() {
        let ctrl = EventController::new();
        let rx_all = ctrl.subscribe_all();
        let rx_clicks = ctrl.subscribe(EventFilter::only(EventKind::CLICK));
        let rx_render = ctrl.subscribe(EventFilter::only(EventKind::RENDERED));

        ctrl.emit(PlotEvent::new(EventKind::CLICK));

        assert!(rx_all.try_recv().is_ok());
        assert!(rx_clicks.try_recv().is_ok());
        assert!(rx_render.try_recv().is_err());
    }

    #[test]
    fn event_controller_combined_kinds() {
        let ctrl = EventController::new();
        let rx_click = ctrl.subscribe(EventFilter::only(EventKind::CLICK));
        let rx_appended = ctrl.subscribe(EventFilter::only(EventKind::POINT_APPENDED));

        ctrl.emit(PlotEvent::new(EventKind::CLICK | EventKind::POINT_APPENDED));

        assert!(rx_click.try_recv().is_ok());
        assert!(rx_appended.try_recv().is_ok());
    }

    #[test]
    fn event_controller_timestamp_set_on_emit() {
        let ctrl = EventController::new();
        let rx = ctrl.subscribe_all();

        std::thread::sleep(std::time::Duration::from_millis(10));
        ctrl.emit(PlotEvent::new(EventKind::CLICK));

        let evt = rx.try_recv().unwrap();
        assert!(evt.timestamp > 0.0);
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(format!("{}", EventKind::CLICK), "CLICK");
        let combo = EventKind::CLICK | EventKind::DOUBLE_CLICK;
        assert_eq!(format!("{}", combo), "CLICK|DOUBLE_CLICK");
        assert_eq!(format!("{}", EventKind::ALL), "ALL");
        let unknown = EventKind(1 << 63);
        assert!(format!("{}", unknown).starts_with("0x"));
    }

    #[test]
    fn event_kinds_do_not_overlap() {
        for (i, (a, _)) in KIND_NAMES.iter().enumerate() {
            for (j, (b, _)) in KIND_NAMES.iter().enumerate() {
                if i != j {
                    assert!(
                        !a.intersects(*b),
                        "EventKind bits {} and {} overlap: {:b} & {:b}",
                        i,
                        j,
                        a.0,
                        b.0
                    );
                }
            }
        }
    }

    #[test]
    fn dropped_receiver_is_cleaned_up() {
        let ctrl = EventController::new();
        let rx1 = ctrl.subscribe_all();
        let rx2 = ctrl.subscribe_all();

        drop(rx1);

        ctrl.emit(PlotEvent::new(EventKind::CLICK));
        assert!(rx2.try_recv().is_ok());

        ctrl.emit(PlotEvent::new(EventKind::RENDERED));
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn plot_event_carries_metadata() {
        let evt = PlotEvent::new(EventKind::CLICK | EventKind::POINT_APPENDED)
            .with_pointer(PointerMeta {
                screen: Some(ScreenPos::new(100.0, 200.0)),
                world: Some(WorldPos::new(100.0, 200.0, 0.0)),
            })
            .with_point(PointMeta {
                index: 0,
                position: Some(WorldPos::new(100.0, 200.0, 0.0)),
                count: 1,
            });

        assert!(evt.kinds.contains(EventKind::CLICK));
        assert!(evt.pointer.is_some());
        assert_eq!(evt.point.unwrap().count, 1);
    }
}
