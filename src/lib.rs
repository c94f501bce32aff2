//! SketchPlot crate root: re-exports and module wiring.
//!
//! This crate provides an interactive plotting (sketching) engine for
//! map-like scenes: click-driven capture of points, lines and polygons,
//! skeleton handles for editing the result, and a render dispatcher that
//! keeps an abstract [`Scene`] in sync with the captured state.
//!
//! The moving parts, bottom up:
//! - `geom`: screen/world position math shared by everything
//! - `series`: time-indexed sampled position series with interpolation
//! - `drawable`: renderer-agnostic shape descriptions
//! - `scheme`: geometry definitions (completion, rendering, skeletons)
//!   and the registry resolving them
//! - `product`: one plot instance binding a scheme to its own series
//! - `skeleton`: handle families and explicit drag sessions
//! - `scene`: the host-facing scene trait plus a headless implementation
//! - `events`: bitflag event kinds and the subscription surface
//! - `dispatch`: per-product drawable diffing against the scene
//! - `controller`: the pointer/keyboard interaction state machine
//! - `schemes`: stock point/line/polygon/rectangle definitions

mod dispatch;
mod signal;

pub mod controller;
pub mod drawable;
pub mod events;
pub mod geom;
pub mod product;
pub mod scene;
pub mod scheme;
pub mod schemes;
pub mod series;
pub mod skeleton;

// Public re-exports for a compact external API
pub use controller::{HandlePalette, PlotConfig, PlotController};
pub use drawable::{Drawable, DrawableId, Geometry, Style};
pub use events::{EventController, EventFilter, EventKind, PlotEvent};
pub use geom::{ScreenPos, WorldPos};
pub use product::{Product, ProductId, ProductOptions, Status, StatusChange};
pub use scene::{ArrowKey, KeyEvent, KeyModifiers, MemoryScene, PointerEvent, PointerKind, Scene};
pub use scheme::{
    CursorStyle, RenderContext, Scheme, SchemeError, SchemeOptions, SchemeRef, SchemeRegistry,
};
pub use schemes::register_builtins;
pub use series::{ExtrapolationStrategy, Sample, SampledSeries, SeriesEvent, TimeInterval};
pub use skeleton::{ActionState, DragSession, HandleFamily};
