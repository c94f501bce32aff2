//! Skeleton handles: the auxiliary control points that edit a finished plot.
//!
//! Each [`HandleFamily`] is a pure mapping from the captured positions to the
//! handle positions it renders, plus a drag semantics that mutates the owning
//! product's series. Drag-in-progress state lives in an explicit
//! [`DragSession`] owned by the interaction controller, never in closures:
//! the interval family's "insert once, then overwrite" bookkeeping is a field
//! of the session and dies with it on pointer-up.

use serde::{Deserialize, Serialize};

use crate::geom::{centroid, midpoints, rotate_heading, WorldPos};
use crate::product::{ProductId, Status};
use crate::scene::ArrowKey;
use crate::series::{Sample, SampledSeries};

/// The reusable handle families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleFamily {
    /// One handle per captured point; dragging overwrites that point.
    Control,
    /// Midpoint handles including the last→first pair; dragging inserts a
    /// new point and keeps overwriting it for the rest of the gesture.
    IntervalClosed,
    /// Midpoint handles stopping after the last adjacent pair.
    IntervalOpen,
    /// A single centroid handle; dragging translates every captured point.
    Moved,
}

impl HandleFamily {
    /// Handle positions for the given captured positions.
    pub fn format(&self, positions: &[WorldPos]) -> Vec<WorldPos> {
        match self {
            HandleFamily::Control => positions.to_vec(),
            HandleFamily::IntervalClosed => midpoints(positions, true),
            HandleFamily::IntervalOpen => midpoints(positions, false),
            HandleFamily::Moved => match positions.len() {
                0 => Vec::new(),
                1 => vec![positions[0]],
                _ => centroid(positions).into_iter().collect(),
            },
        }
    }

    /// Handles only operate on a completed, active shape. While defining (or
    /// idle/disabled) every family is inert.
    pub fn enabled_for(&self, status: Status) -> bool {
        matches!(status, Status::Active)
    }
}

/// Presentation state of a single handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionState {
    Idle,
    Hover,
    Active,
    Operating,
}

/// Derive the action state for one handle. Exactly one wins, checked in
/// priority order: dragged > selected > hovered > idle.
pub fn derive_action(dragged: bool, selected: bool, hovered: bool) -> ActionState {
    if dragged {
        ActionState::Operating
    } else if selected {
        ActionState::Active
    } else if hovered {
        ActionState::Hover
    } else {
        ActionState::Idle
    }
}

/// Explicit per-gesture drag state.
///
/// Created on pointer-down over an enabled handle, fed every pointer-move,
/// and dropped on pointer-up. A fresh session starts with no insertion
/// index, so the next interval drag inserts again.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub product: ProductId,
    pub family: HandleFamily,
    /// Index of the dragged handle within its family's formatted positions.
    pub index: usize,
    /// Index of the point materialized by an interval drag, once inserted.
    pub insert_index: Option<usize>,
    pub start_world: WorldPos,
    /// Captured positions snapshotted at drag start (basis for `Moved`).
    pub start_positions: Vec<WorldPos>,
    /// Whether any drag tick was applied (used to swallow the trailing click).
    pub moved: bool,
}

impl DragSession {
    pub fn begin(
        product: ProductId,
        family: HandleFamily,
        index: usize,
        start_world: WorldPos,
        start_positions: Vec<WorldPos>,
    ) -> Self {
        Self {
            product,
            family,
            index,
            insert_index: None,
            start_world,
            start_positions,
            moved: false,
        }
    }

    /// Apply one drag tick at `world`, mutating the series at `time`.
    pub fn drag_to(&mut self, series: &mut SampledSeries, time: f64, world: WorldPos) {
        let mut positions = series
            .get_value(time)
            .map(|s| s.positions)
            .unwrap_or_default();

        match self.family {
            HandleFamily::Control => {
                if self.index >= positions.len() {
                    return;
                }
                positions[self.index] = world;
            }
            HandleFamily::IntervalClosed | HandleFamily::IntervalOpen => match self.insert_index {
                None => {
                    let at = (self.index + 1).min(positions.len());
                    positions.insert(at, world);
                    self.insert_index = Some(at);
                }
                Some(at) => {
                    if at >= positions.len() {
                        return;
                    }
                    positions[at] = world;
                }
            },
            HandleFamily::Moved => {
                let delta = world - self.start_world;
                positions = self.start_positions.iter().map(|p| *p + delta).collect();
            }
        }

        self.moved = true;
        series.set_sample(Sample::new(time, positions));
    }
}

/// Nudge one captured point by `step` in the arrow-key direction, expressed
/// relative to the camera `heading`. Returns whether the series was mutated.
pub fn nudge(
    series: &mut SampledSeries,
    time: f64,
    index: usize,
    key: ArrowKey,
    heading: f64,
    step: f64,
) -> bool {
    let mut positions = series
        .get_value(time)
        .map(|s| s.positions)
        .unwrap_or_default();
    if index >= positions.len() {
        return false;
    }
    let dir = match key {
        ArrowKey::Up => WorldPos::new(0.0, 1.0, 0.0),
        ArrowKey::Down => WorldPos::new(0.0, -1.0, 0.0),
        ArrowKey::Left => WorldPos::new(-1.0, 0.0, 0.0),
        ArrowKey::Right => WorldPos::new(1.0, 0.0, 0.0),
    };
    positions[index] += rotate_heading(dir, heading) * step;
    series.set_sample(Sample::new(time, positions));
    true
}
