//! Drawable descriptions handed to the scene.
//!
//! A [`Drawable`] is a renderer-agnostic description of a point, polyline or
//! polygon plus a small style. Identity is the numeric id: the render
//! dispatcher diffs old vs. new drawable sets by id, so a scheme that wants a
//! shape to survive a recompute re-issues it under the same id (see
//! [`Drawable::with_id`]).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::geom::WorldPos;

/// Numeric identifier of a drawable, unique within the process.
pub type DrawableId = u64;

/// Geometry of a drawable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point { position: WorldPos },
    Polyline { positions: Vec<WorldPos> },
    Polygon { ring: Vec<WorldPos> },
}

impl Geometry {
    /// Whether two geometries are of the same kind (ignoring coordinates).
    pub fn same_kind(&self, other: &Geometry) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Presentation hints attached to a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// RGB color.
    pub color: [u8; 3],
    /// Stroke width in pixels (polylines, polygon outlines).
    pub width: f32,
    /// Marker size in pixels (points).
    pub size: f32,
    /// Fill polygons.
    pub filled: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: [255, 196, 0],
            width: 2.0,
            size: 8.0,
            filled: true,
        }
    }
}

/// One drawable shape owned (logically) by a plotted product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub id: DrawableId,
    pub geometry: Geometry,
    pub style: Style,
}

impl Drawable {
    /// Allocate a fresh process-unique drawable id.
    pub fn allocate_id() -> DrawableId {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        NEXT_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a drawable with a freshly allocated id and default style.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: Self::allocate_id(),
            geometry,
            style: Style::default(),
        }
    }

    /// Create a drawable under an existing id (identity-preserving update).
    pub fn with_id(id: DrawableId, geometry: Geometry, style: Style) -> Self {
        Self {
            id,
            geometry,
            style,
        }
    }

    pub fn styled(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}
