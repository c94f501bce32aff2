//! Builtin schemes: the stock shapes a host usually wants out of the box.
//!
//! Every render callback reuses drawable ids from the previous render (per
//! geometry kind), so a shape keeps its scene identity across recomputes and
//! the dispatcher can diff instead of flicker. All builtins preview the
//! pointer position while defining: the working outline includes the point
//! under the cursor until the next click commits it.

use crate::drawable::{Drawable, Geometry, Style};
use crate::geom::WorldPos;
use crate::scheme::{CursorStyle, RenderContext, Scheme, SchemeOptions, SchemeRegistry};
use crate::skeleton::HandleFamily;

/// Type name of [`point_scheme`].
pub const POINT: &str = "Point";
/// Type name of [`line_string_scheme`].
pub const LINE_STRING: &str = "LineString";
/// Type name of [`polyline_scheme`].
pub const POLYLINE: &str = "Polyline";
/// Type name of [`polygon_scheme`].
pub const POLYGON: &str = "Polygon";
/// Type name of [`rectangle_scheme`].
pub const RECTANGLE: &str = "Rectangle";

/// Register every builtin scheme under its canonical type name.
pub fn register_builtins(registry: &mut SchemeRegistry) {
    for scheme in [
        point_scheme(),
        line_string_scheme(),
        polyline_scheme(),
        polygon_scheme(),
        rectangle_scheme(),
    ] {
        // builtin names are non-empty, registration cannot fail
        let _ = registry.register(scheme);
    }
}

/// Captured positions plus the live pointer position while defining.
fn working_positions(ctx: &RenderContext<'_>) -> Vec<WorldPos> {
    let mut positions = ctx.positions.to_vec();
    if let Some(mouse) = ctx.mouse {
        positions.push(mouse);
    }
    positions
}

/// Re-issue a drawable under the previous render's id for the same geometry
/// kind, or allocate a fresh one.
fn reuse(previous: &[Drawable], geometry: Geometry, style: Style) -> Drawable {
    match previous.iter().find(|d| d.geometry.same_kind(&geometry)) {
        Some(old) => Drawable::with_id(old.id, geometry, style),
        None => Drawable::new(geometry).styled(style),
    }
}

/// A single marker; the first click completes it.
pub fn point_scheme() -> Scheme {
    SchemeOptions::new(POINT)
        .complete(|positions| !positions.is_empty())
        .render(|ctx| {
            let working = working_positions(ctx);
            let Some(&position) = working.first() else {
                return Ok(Vec::new());
            };
            Ok(vec![reuse(
                ctx.previous,
                Geometry::Point { position },
                Style::default(),
            )])
        })
        .skeletons([HandleFamily::Control])
        .defining_cursor(CursorStyle::Crosshair)
        .build()
}

/// A two-point segment chain that completes on the second click.
pub fn line_string_scheme() -> Scheme {
    SchemeOptions::new(LINE_STRING)
        .complete(|positions| positions.len() >= 2)
        .render(|ctx| Ok(polyline_drawables(ctx)))
        .skeletons([
            HandleFamily::Control,
            HandleFamily::IntervalOpen,
            HandleFamily::Moved,
        ])
        .defining_cursor(CursorStyle::Crosshair)
        .build()
}

/// An open-ended polyline: clicks keep appending until a double click forces
/// completion (at two points minimum).
pub fn polyline_scheme() -> Scheme {
    SchemeOptions::new(POLYLINE)
        .force_complete(|positions| positions.len() >= 2)
        .render(|ctx| Ok(polyline_drawables(ctx)))
        .skeletons([
            HandleFamily::Control,
            HandleFamily::IntervalOpen,
            HandleFamily::Moved,
        ])
        .defining_cursor(CursorStyle::Crosshair)
        .build()
}

fn polyline_drawables(ctx: &RenderContext<'_>) -> Vec<Drawable> {
    let working = working_positions(ctx);
    if working.len() < 2 {
        return Vec::new();
    }
    vec![reuse(
        ctx.previous,
        Geometry::Polyline { positions: working },
        Style::default(),
    )]
}

/// A closed ring, forced complete by double click at three points minimum.
/// Below three working points it degrades to a polyline preview.
pub fn polygon_scheme() -> Scheme {
    SchemeOptions::new(POLYGON)
        .force_complete(|positions| positions.len() >= 3)
        .render(|ctx| {
            let working = working_positions(ctx);
            if working.len() < 3 {
                return Ok(polyline_drawables(ctx));
            }
            let mut ring = working;
            ring.push(ring[0]);
            Ok(vec![reuse(
                ctx.previous,
                Geometry::Polygon { ring },
                Style::default(),
            )])
        })
        .skeletons([
            HandleFamily::Control,
            HandleFamily::IntervalClosed,
            HandleFamily::Moved,
        ])
        .defining_cursor(CursorStyle::Crosshair)
        .build()
}

/// An axis-aligned rectangle spanned by two corner clicks.
pub fn rectangle_scheme() -> Scheme {
    SchemeOptions::new(RECTANGLE)
        .complete(|positions| positions.len() >= 2)
        .render(|ctx| {
            let working = working_positions(ctx);
            if working.len() < 2 {
                return Ok(Vec::new());
            }
            let (a, b) = (working[0], working[1]);
            let ring = vec![
                WorldPos::new(a.x, a.y, a.z),
                WorldPos::new(b.x, a.y, a.z),
                WorldPos::new(b.x, b.y, a.z),
                WorldPos::new(a.x, b.y, a.z),
                WorldPos::new(a.x, a.y, a.z),
            ];
            Ok(vec![reuse(
                ctx.previous,
                Geometry::Polygon { ring },
                Style::default(),
            )])
        })
        .skeletons([HandleFamily::Control, HandleFamily::Moved])
        .defining_cursor(CursorStyle::Crosshair)
        .build()
}

/// Convenience: a fresh registry pre-loaded with the builtins.
pub fn builtin_registry() -> SchemeRegistry {
    let mut registry = SchemeRegistry::new();
    register_builtins(&mut registry);
    registry
}
