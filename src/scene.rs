//! The scene capability the plotting engine draws into, and its input types.
//!
//! The engine never talks to a renderer directly: it picks, projects and
//! pushes drawables through the [`Scene`] trait and receives pointer/key
//! input as plain values. [`MemoryScene`] is a headless, ground-plane
//! implementation with real screen-space hit-testing, used by the demos and
//! the scenario tests.

use crate::drawable::{Drawable, DrawableId, Geometry};
use crate::geom::{point_in_ring, point_segment_distance, ScreenPos, WorldPos};
use crate::scheme::CursorStyle;

/// Pointer event categories delivered by the host input stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    LeftDown,
    LeftUp,
    LeftClick,
    DoubleClick,
    RightClick,
}

/// Keyboard modifier state (mirrors the host's modifier flags).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub command: bool,
}

/// One pointer event at a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub screen: ScreenPos,
    pub modifiers: KeyModifiers,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, screen: ScreenPos) -> Self {
        Self {
            kind,
            screen,
            modifiers: KeyModifiers::default(),
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Move, ScreenPos::new(x, y))
    }

    pub fn left_down(x: f32, y: f32) -> Self {
        Self::new(PointerKind::LeftDown, ScreenPos::new(x, y))
    }

    pub fn left_up(x: f32, y: f32) -> Self {
        Self::new(PointerKind::LeftUp, ScreenPos::new(x, y))
    }

    pub fn left_click(x: f32, y: f32) -> Self {
        Self::new(PointerKind::LeftClick, ScreenPos::new(x, y))
    }

    pub fn double_click(x: f32, y: f32) -> Self {
        Self::new(PointerKind::DoubleClick, ScreenPos::new(x, y))
    }

    pub fn right_click(x: f32, y: f32) -> Self {
        Self::new(PointerKind::RightClick, ScreenPos::new(x, y))
    }
}

/// Arrow keys used to nudge a selected control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

/// One keyboard event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub key: ArrowKey,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn new(key: ArrowKey) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
        }
    }
}

/// The external scene collaborator.
///
/// `add_drawable` and `remove_drawable` are idempotent: re-adding an existing
/// id replaces its content in place, removing an absent id is a no-op.
/// Implementations that have been torn down should return `false` from
/// `is_live`, which stops the controller from touching them.
pub trait Scene {
    /// Topmost drawable under the screen position, if any.
    fn pick_at(&self, screen: ScreenPos) -> Option<DrawableId>;
    /// Project a screen position onto the world. May fail (pointer off the
    /// plottable surface).
    fn screen_to_world(&self, screen: ScreenPos) -> Option<WorldPos>;
    /// Project a world position to the screen. May fail (behind the camera).
    fn world_to_screen(&self, world: WorldPos) -> Option<ScreenPos>;
    fn add_drawable(&mut self, drawable: Drawable);
    fn remove_drawable(&mut self, id: DrawableId);
    /// Set or clear the pointer cursor.
    fn set_cursor(&mut self, cursor: Option<CursorStyle>);
    /// Camera heading in radians, for heading-relative keyboard nudges.
    fn camera_heading(&self) -> f64 {
        0.0
    }
    /// Whether the scene still accepts calls.
    fn is_live(&self) -> bool {
        true
    }
}

/// Headless scene over a flat ground plane: world `(x, y, _)` maps to screen
/// `(x, y)` one-to-one. Later-added drawables are on top for picking.
pub struct MemoryScene {
    drawables: Vec<Drawable>,
    cursor: Option<CursorStyle>,
    pick_tolerance: f32,
    heading: f64,
    live: bool,
    /// Total add calls, for asserting on dispatcher behavior.
    pub add_calls: usize,
    /// Total remove calls.
    pub remove_calls: usize,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            drawables: Vec::new(),
            cursor: None,
            pick_tolerance: 6.0,
            heading: 0.0,
            live: true,
            add_calls: 0,
            remove_calls: 0,
        }
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: DrawableId) -> bool {
        self.drawables.iter().any(|d| d.id == id)
    }

    pub fn cursor(&self) -> Option<CursorStyle> {
        self.cursor
    }

    pub fn set_heading(&mut self, heading: f64) {
        self.heading = heading;
    }

    pub fn set_pick_tolerance(&mut self, tolerance: f32) {
        self.pick_tolerance = tolerance;
    }

    /// Simulate teardown: the scene stops being live.
    pub fn shut_down(&mut self) {
        self.live = false;
    }

    fn project(&self, world: WorldPos) -> ScreenPos {
        ScreenPos::new(world.x as f32, world.y as f32)
    }

    fn hit(&self, drawable: &Drawable, at: ScreenPos) -> bool {
        let tol = self.pick_tolerance;
        match &drawable.geometry {
            Geometry::Point { position } => {
                at.distance(self.project(*position)) <= tol.max(drawable.style.size)
            }
            Geometry::Polyline { positions } => {
                let projected: Vec<ScreenPos> =
                    positions.iter().map(|p| self.project(*p)).collect();
                projected
                    .windows(2)
                    .any(|w| point_segment_distance(at, w[0], w[1]) <= tol)
            }
            Geometry::Polygon { ring } => {
                let projected: Vec<ScreenPos> = ring.iter().map(|p| self.project(*p)).collect();
                if point_in_ring(at, &projected) {
                    return true;
                }
                let mut edges: Vec<ScreenPos> = projected.clone();
                if let Some(first) = projected.first() {
                    edges.push(*first);
                }
                edges
                    .windows(2)
                    .any(|w| point_segment_distance(at, w[0], w[1]) <= tol)
            }
        }
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for MemoryScene {
    fn pick_at(&self, screen: ScreenPos) -> Option<DrawableId> {
        self.drawables
            .iter()
            .rev()
            .find(|d| self.hit(d, screen))
            .map(|d| d.id)
    }

    fn screen_to_world(&self, screen: ScreenPos) -> Option<WorldPos> {
        Some(WorldPos::new(screen.x as f64, screen.y as f64, 0.0))
    }

    fn world_to_screen(&self, world: WorldPos) -> Option<ScreenPos> {
        Some(self.project(world))
    }

    fn add_drawable(&mut self, drawable: Drawable) {
        self.add_calls += 1;
        match self.drawables.iter_mut().find(|d| d.id == drawable.id) {
            Some(existing) => *existing = drawable,
            None => self.drawables.push(drawable),
        }
    }

    fn remove_drawable(&mut self, id: DrawableId) {
        self.remove_calls += 1;
        self.drawables.retain(|d| d.id != id);
    }

    fn set_cursor(&mut self, cursor: Option<CursorStyle>) {
        self.cursor = cursor;
    }

    fn camera_heading(&self) -> f64 {
        self.heading
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
