//! Interaction controller: wires pointer input to capture and editing.
//!
//! [`PlotController`] owns the managed products, the `current` selection,
//! the per-gesture drag session and the double-click grace window. The host
//! feeds it pointer/key events as they arrive and calls
//! [`on_frame`](PlotController::on_frame) once per frame; all drawable
//! recomputation happens there, so any number of mutations between frames
//! coalesce into at most one render per product.
//!
//! Capture state machine, per pointer event while the current product is
//! `Defining`:
//! - left click: resolve the world position under the cursor (no-op when the
//!   projection fails) and pend it for the grace window; when it matures the
//!   point is appended and the scheme's `complete` predicate may promote the
//!   product to `Active`.
//! - double click: cancel the pending click, append exactly one point (the
//!   double-click's own position) and evaluate `force_complete`.
//! - right click: pop the most recent point.
//!
//! While not defining, a left click is a selection pick, and pointer
//! down/move/up over a skeleton handle runs a drag gesture.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::dispatch::{apply_diff, RenderDispatcher};
use crate::drawable::{Drawable, DrawableId, Geometry, Style};
use crate::events::{
    DragMeta, EventController, EventKind, PlotEvent, PointMeta, PointerMeta, ProductMeta,
};
use crate::geom::{ScreenPos, WorldPos};
use crate::product::{Product, ProductId, ProductOptions, Status, StatusChange};
use crate::scene::{KeyEvent, PointerEvent, PointerKind, Scene};
use crate::scheme::{CursorStyle, SchemeError, SchemeRegistry};
use crate::series::SeriesEvent;
use crate::skeleton::{derive_action, nudge, ActionState, DragSession, HandleFamily};

/// Handle colors keyed by action state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlePalette {
    pub idle: [u8; 3],
    pub hover: [u8; 3],
    pub active: [u8; 3],
    pub operating: [u8; 3],
}

impl Default for HandlePalette {
    fn default() -> Self {
        Self {
            idle: [255, 255, 255],
            hover: [255, 220, 0],
            active: [0, 190, 255],
            operating: [255, 90, 0],
        }
    }
}

/// Tunables for the interaction controller.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// How long a single click is pended so a concurrent double-click can
    /// suppress it. Input stacks deliver the paired click events a few
    /// milliseconds before the double-click.
    pub double_click_grace: Duration,
    /// World-units step for keyboard nudges of a selected control point.
    pub nudge_step: f64,
    /// Marker size of skeleton handles, in pixels.
    pub handle_size: f32,
    pub handle_palette: HandlePalette,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            double_click_grace: Duration::from_millis(5),
            nudge_step: 1.0,
            handle_size: 10.0,
            handle_palette: HandlePalette::default(),
        }
    }
}

struct PendingClick {
    world: WorldPos,
    screen: ScreenPos,
    at: Instant,
}

struct ProductEntry {
    product: Product,
    series_rx: Receiver<SeriesEvent>,
    status_rx: Receiver<StatusChange>,
    dirty: bool,
    /// Last-rendered skeleton handle drawables for this product.
    handle_drawables: Vec<Drawable>,
}

/// Orchestrates capture, selection and skeleton editing over a [`Scene`].
pub struct PlotController {
    registry: SchemeRegistry,
    config: PlotConfig,
    events: EventController,
    dispatcher: RenderDispatcher,
    products: Vec<ProductEntry>,
    current: Option<ProductId>,
    pending_click: Option<PendingClick>,
    drag: Option<DragSession>,
    /// Stable ids for handle drawables, keyed by (product, family, index).
    handle_ids: HashMap<(ProductId, HandleFamily, usize), DrawableId>,
    /// Reverse map from a handle drawable to its owner.
    handle_owners: HashMap<DrawableId, (ProductId, HandleFamily, usize)>,
    /// Product-body drawables, for selection picks.
    drawable_owners: HashMap<DrawableId, ProductId>,
    hovered_handle: Option<DrawableId>,
    selected_handle: Option<DrawableId>,
    /// Preview point under the pointer while defining.
    preview: Option<WorldPos>,
    last_cursor: Option<CursorStyle>,
    /// Set when a drag that actually moved ends, to swallow the trailing
    /// click the input stack delivers after pointer-up.
    suppress_next_click: bool,
}

impl PlotController {
    pub fn new(registry: SchemeRegistry) -> Self {
        Self::with_config(registry, PlotConfig::default())
    }

    pub fn with_config(registry: SchemeRegistry, config: PlotConfig) -> Self {
        Self {
            registry,
            config,
            events: EventController::new(),
            dispatcher: RenderDispatcher::new(),
            products: Vec::new(),
            current: None,
            pending_click: None,
            drag: None,
            handle_ids: HashMap::new(),
            handle_owners: HashMap::new(),
            drawable_owners: HashMap::new(),
            hovered_handle: None,
            selected_handle: None,
            preview: None,
            last_cursor: None,
            suppress_next_click: false,
        }
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemeRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// The event surface host code subscribes to.
    pub fn events(&self) -> &EventController {
        &self.events
    }

    /// Id of the current (edited) product, if any.
    pub fn current(&self) -> Option<ProductId> {
        self.current
    }

    pub fn current_product(&self) -> Option<&Product> {
        let id = self.current?;
        self.product(id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products
            .iter()
            .find(|e| e.product.id() == id)
            .map(|e| &e.product)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().map(|e| &e.product)
    }

    fn index_of(&self, id: ProductId) -> Option<usize> {
        self.products.iter().position(|e| e.product.id() == id)
    }

    fn product_meta(&self, index: usize) -> ProductMeta {
        let product = &self.products[index].product;
        ProductMeta {
            product: product.id(),
            scheme_type: product.scheme().type_name().to_string(),
            status: Some(product.status()),
        }
    }

    // ── Session management ──────────────────────────────────────────────

    /// Begin a new capture session for the given scheme.
    pub fn execute(
        &mut self,
        scheme: impl Into<crate::scheme::SchemeRef>,
        scene: &mut dyn Scene,
    ) -> Result<ProductId, SchemeError> {
        self.execute_with(ProductOptions::new(scheme), scene)
    }

    /// Begin a new capture session from full product options.
    pub fn execute_with(
        &mut self,
        options: ProductOptions,
        scene: &mut dyn Scene,
    ) -> Result<ProductId, SchemeError> {
        let scheme = self.registry.resolve(options.scheme)?;
        self.settle_defining_current(scene);

        let mut product = Product::new(scheme, options.id, options.seed);
        let id = product.id();
        let series_rx = product.series_mut().subscribe();
        let status_rx = product.subscribe_status();
        self.products.push(ProductEntry {
            product,
            series_rx,
            status_rx,
            dirty: true,
            handle_drawables: Vec::new(),
        });
        self.current = Some(id);
        self.selected_handle = None;
        debug!(product = id, "capture session started");
        let index = self.products.len() - 1;
        self.events.emit(
            PlotEvent::new(EventKind::PRODUCT_STARTED).with_product(self.product_meta(index)),
        );
        Ok(id)
    }

    /// Abandon the in-progress product: its drawables are removed and the
    /// product is dropped. No-op when the current product is not defining.
    pub fn cancel(&mut self, scene: &mut dyn Scene) {
        let Some(id) = self.current else { return };
        let Some(index) = self.index_of(id) else {
            return;
        };
        if self.products[index].product.status() != Status::Defining {
            return;
        }
        self.discard_product(id, scene);
    }

    /// Re-enter capture on an existing product (explicit re-activation).
    pub fn redefine(&mut self, id: ProductId, scene: &mut dyn Scene) -> bool {
        self.settle_defining_current(scene);
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.products[index].product.set_status(Status::Defining);
        self.products[index].dirty = true;
        self.current = Some(id);
        self.selected_handle = None;
        true
    }

    /// Remove a product and everything it rendered.
    pub fn remove_product(&mut self, id: ProductId, scene: &mut dyn Scene) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.discard_product(id, scene);
        true
    }

    /// Tear down: remove every managed drawable from the scene.
    pub fn dispose(&mut self, scene: &mut dyn Scene) {
        let ids: Vec<ProductId> = self.products.iter().map(|e| e.product.id()).collect();
        for id in ids {
            self.discard_product(id, scene);
        }
        if self.last_cursor.is_some() {
            scene.set_cursor(None);
            self.last_cursor = None;
        }
    }

    /// Leaving a defining product runs one completion check: satisfied →
    /// `Active`, otherwise the incomplete product is discarded. A product is
    /// never silently left mid-capture.
    fn settle_defining_current(&mut self, scene: &mut dyn Scene) {
        let Some(id) = self.current else { return };
        let Some(index) = self.index_of(id) else {
            return;
        };
        if self.products[index].product.status() != Status::Defining {
            return;
        }
        self.pending_click = None;
        self.preview = None;
        let positions = self.products[index].product.positions();
        if self.products[index]
            .product
            .scheme()
            .is_force_complete(&positions)
        {
            self.products[index].product.set_status(Status::Active);
            self.products[index].dirty = true;
            self.events.emit(
                PlotEvent::new(EventKind::PRODUCT_COMPLETED)
                    .with_product(self.product_meta(index)),
            );
        } else {
            self.discard_product(id, scene);
        }
    }

    fn discard_product(&mut self, id: ProductId, scene: &mut dyn Scene) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let meta = self.product_meta(index);

        self.dispatcher.remove_all(id, scene);
        let entry = self.products.remove(index);
        for drawable in &entry.handle_drawables {
            scene.remove_drawable(drawable.id);
            self.handle_owners.remove(&drawable.id);
        }
        self.handle_ids.retain(|(pid, _, _), _| *pid != id);
        self.handle_owners.retain(|_, (pid, _, _)| *pid != id);
        self.drawable_owners.retain(|_, pid| *pid != id);

        if self.current == Some(id) {
            self.current = None;
            self.preview = None;
            self.pending_click = None;
            self.selected_handle = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.product == id) {
            self.drag = None;
        }
        debug!(product = id, "product discarded");
        self.events
            .emit(PlotEvent::new(EventKind::PRODUCT_CANCELLED).with_product(meta));
    }

    // ── Pointer input ───────────────────────────────────────────────────

    pub fn handle_pointer(&mut self, event: PointerEvent, scene: &mut dyn Scene) {
        if !scene.is_live() {
            return;
        }
        match event.kind {
            PointerKind::Move => self.on_move(event.screen, scene),
            PointerKind::LeftDown => self.on_left_down(event.screen, scene),
            PointerKind::LeftUp => self.on_left_up(event.screen),
            PointerKind::LeftClick => self.on_left_click(event.screen, scene),
            PointerKind::DoubleClick => self.on_double_click(event.screen, scene),
            PointerKind::RightClick => self.on_right_click(event.screen, scene),
        }
    }

    fn on_move(&mut self, screen: ScreenPos, scene: &mut dyn Scene) {
        if let Some(mut session) = self.drag.take() {
            if let Some(world) = scene.screen_to_world(screen) {
                if let Some(index) = self.index_of(session.product) {
                    let had_insert = session.insert_index.is_some();
                    let time = self.products[index].product.capture_time();
                    session.drag_to(self.products[index].product.series_mut(), time, world);
                    self.products[index].dirty = true;
                    if !had_insert {
                        if let Some(at) = session.insert_index {
                            self.events.emit(
                                PlotEvent::new(EventKind::POINT_INSERTED)
                                    .with_product(self.product_meta(index))
                                    .with_drag(DragMeta {
                                        family: session.family,
                                        index: session.index,
                                        inserted_at: Some(at),
                                    }),
                            );
                        }
                    }
                }
            }
            self.drag = Some(session);
            return;
        }

        // hover tracking for handle restyling
        let hovered = scene
            .pick_at(screen)
            .filter(|id| self.handle_owners.contains_key(id));
        if hovered != self.hovered_handle {
            self.hovered_handle = hovered;
        }

        if let Some(index) = self.defining_current_index() {
            self.preview = scene.screen_to_world(screen);
            self.products[index].dirty = true;
        }
    }

    fn on_left_down(&mut self, screen: ScreenPos, scene: &mut dyn Scene) {
        if self.drag.is_some() {
            return;
        }
        let Some(picked) = scene.pick_at(screen) else {
            return;
        };
        let Some(&(pid, family, index)) = self.handle_owners.get(&picked) else {
            return;
        };
        if self.current != Some(pid) {
            return;
        }
        let Some(pindex) = self.index_of(pid) else {
            return;
        };
        let status = self.products[pindex].product.status();
        if !family.enabled_for(status) {
            return;
        }
        let Some(world) = scene.screen_to_world(screen) else {
            return;
        };
        let start_positions = self.products[pindex].product.positions();
        self.drag = Some(DragSession::begin(
            pid,
            family,
            index,
            world,
            start_positions,
        ));
        self.events.emit(
            PlotEvent::new(EventKind::DRAG_STARTED)
                .with_product(self.product_meta(pindex))
                .with_drag(DragMeta {
                    family,
                    index,
                    inserted_at: None,
                }),
        );
    }

    fn on_left_up(&mut self, _screen: ScreenPos) {
        let Some(session) = self.drag.take() else {
            return;
        };
        if session.moved {
            self.suppress_next_click = true;
        }
        let mut kinds = EventKind::DRAG_ENDED;
        if session.moved {
            kinds |= EventKind::POINT_MOVED;
        }
        if let Some(index) = self.index_of(session.product) {
            self.products[index].dirty = true;
            self.events.emit(
                PlotEvent::new(kinds)
                    .with_product(self.product_meta(index))
                    .with_drag(DragMeta {
                        family: session.family,
                        index: session.index,
                        inserted_at: session.insert_index,
                    }),
            );
        }
        // the session is dropped here; a later drag starts a fresh insertion
    }

    fn on_left_click(&mut self, screen: ScreenPos, scene: &mut dyn Scene) {
        if self.suppress_next_click {
            self.suppress_next_click = false;
            return;
        }

        // A matured pending click is a committed point even when no frame ran
        // in between; only the paired clicks inside the grace window may be
        // replaced by the double-click gesture.
        self.commit_pending_click();

        if let Some(index) = self.defining_current_index() {
            // Expected, frequent failure: pointer over empty sky.
            let Some(world) = scene.screen_to_world(screen) else {
                return;
            };
            self.pending_click = Some(PendingClick {
                world,
                screen,
                at: Instant::now(),
            });
            self.events.emit(
                PlotEvent::new(EventKind::CLICK)
                    .with_product(self.product_meta(index))
                    .with_pointer(PointerMeta {
                        screen: Some(screen),
                        world: Some(world),
                    }),
            );
            return;
        }

        self.on_selection_click(screen, scene);
    }

    fn on_selection_click(&mut self, screen: ScreenPos, scene: &mut dyn Scene) {
        let picked = scene.pick_at(screen);

        if let Some(id) = picked {
            if let Some(&(pid, _, _)) = self.handle_owners.get(&id) {
                if self.current == Some(pid) {
                    self.selected_handle = Some(id);
                    return;
                }
            }
            if let Some(&pid) = self.drawable_owners.get(&id) {
                if self.current != Some(pid) {
                    self.settle_defining_current(scene);
                    self.current = Some(pid);
                    self.selected_handle = None;
                    if let Some(index) = self.index_of(pid) {
                        self.events.emit(
                            PlotEvent::new(EventKind::PRODUCT_SELECTED)
                                .with_product(self.product_meta(index)),
                        );
                    }
                }
                return;
            }
        }

        // empty space or a foreign drawable: deselect
        if let Some(id) = self.current.take() {
            self.selected_handle = None;
            if let Some(index) = self.index_of(id) {
                self.events.emit(
                    PlotEvent::new(EventKind::PRODUCT_DESELECTED)
                        .with_product(self.product_meta(index)),
                );
            }
        }
    }

    fn on_double_click(&mut self, screen: ScreenPos, scene: &mut dyn Scene) {
        // a pending click still inside the grace window is this gesture's own
        // paired half and is dropped; a matured one is an earlier, real point
        self.commit_pending_click();
        self.pending_click = None;
        let Some(index) = self.defining_current_index() else {
            return;
        };
        let Some(world) = scene.screen_to_world(screen) else {
            return;
        };
        self.products[index].product.append_point(world);
        self.products[index].dirty = true;
        let count = self.products[index].product.positions().len();
        self.events.emit(
            PlotEvent::new(EventKind::DOUBLE_CLICK | EventKind::POINT_APPENDED)
                .with_product(self.product_meta(index))
                .with_point(PointMeta {
                    index: count - 1,
                    position: Some(world),
                    count,
                }),
        );
        self.try_complete(index, true);
    }

    fn on_right_click(&mut self, _screen: ScreenPos, _scene: &mut dyn Scene) {
        self.commit_pending_click();
        self.pending_click = None;
        let Some(index) = self.defining_current_index() else {
            return;
        };
        if let Some(popped) = self.products[index].product.pop_point() {
            self.products[index].dirty = true;
            let count = self.products[index].product.positions().len();
            self.events.emit(
                PlotEvent::new(EventKind::RIGHT_CLICK | EventKind::POINT_REMOVED)
                    .with_product(self.product_meta(index))
                    .with_point(PointMeta {
                        index: count,
                        position: Some(popped),
                        count,
                    }),
            );
        }
    }

    // ── Keyboard input ──────────────────────────────────────────────────

    pub fn handle_key(&mut self, event: KeyEvent, scene: &mut dyn Scene) {
        if !scene.is_live() {
            return;
        }
        let Some(selected) = self.selected_handle else {
            return;
        };
        let Some(&(pid, family, index)) = self.handle_owners.get(&selected) else {
            return;
        };
        if family != HandleFamily::Control || self.current != Some(pid) {
            return;
        }
        let Some(pindex) = self.index_of(pid) else {
            return;
        };
        if !self.products[pindex].product.is_active() {
            return;
        }
        let heading = scene.camera_heading();
        let step = self.config.nudge_step;
        let time = self.products[pindex].product.capture_time();
        if nudge(
            self.products[pindex].product.series_mut(),
            time,
            index,
            event.key,
            heading,
            step,
        ) {
            self.products[pindex].dirty = true;
            let positions = self.products[pindex].product.positions();
            self.events.emit(
                PlotEvent::new(EventKind::KEY_NUDGE | EventKind::POINT_MOVED)
                    .with_product(self.product_meta(pindex))
                    .with_point(PointMeta {
                        index,
                        position: positions.get(index).copied(),
                        count: positions.len(),
                    }),
            );
        }
    }

    // ── Frame tick ──────────────────────────────────────────────────────

    /// Run one frame: commit matured clicks, drain change notifications,
    /// re-render dirty products, refresh skeleton handles and the cursor.
    pub fn on_frame(&mut self, scene: &mut dyn Scene) {
        if !scene.is_live() {
            return;
        }
        self.commit_pending_click();
        self.drain_notifications();
        self.render_dirty(scene);
        self.refresh_handles(scene);
        self.refresh_cursor(scene);
    }

    fn defining_current_index(&self) -> Option<usize> {
        let id = self.current?;
        let index = self.index_of(id)?;
        self.products[index]
            .product
            .is_defining()
            .then_some(index)
    }

    fn commit_pending_click(&mut self) {
        let Some(pending) = self.pending_click.take() else {
            return;
        };
        if pending.at.elapsed() < self.config.double_click_grace {
            self.pending_click = Some(pending);
            return;
        }
        let Some(index) = self.defining_current_index() else {
            return;
        };
        self.products[index].product.append_point(pending.world);
        self.products[index].dirty = true;
        let count = self.products[index].product.positions().len();
        self.events.emit(
            PlotEvent::new(EventKind::POINT_APPENDED)
                .with_product(self.product_meta(index))
                .with_point(PointMeta {
                    index: count - 1,
                    position: Some(pending.world),
                    count,
                })
                .with_pointer(PointerMeta {
                    screen: Some(pending.screen),
                    world: Some(pending.world),
                }),
        );
        self.try_complete(index, false);
    }

    /// Evaluate the completion predicate and promote to `Active` when it
    /// holds. `forced` selects the double-click predicate.
    fn try_complete(&mut self, index: usize, forced: bool) {
        let positions = self.products[index].product.positions();
        let scheme = self.products[index].product.scheme();
        let done = if forced {
            scheme.is_force_complete(&positions)
        } else {
            scheme.is_complete(&positions)
        };
        if !done {
            return;
        }
        self.products[index].product.set_status(Status::Active);
        self.products[index].dirty = true;
        self.preview = None;
        self.events.emit(
            PlotEvent::new(EventKind::PRODUCT_COMPLETED).with_product(self.product_meta(index)),
        );
    }

    fn drain_notifications(&mut self) {
        for index in 0..self.products.len() {
            let entry = &mut self.products[index];
            if entry.series_rx.try_iter().count() > 0 {
                entry.dirty = true;
            }
            let changes: Vec<StatusChange> = entry.status_rx.try_iter().collect();
            if !changes.is_empty() {
                entry.dirty = true;
            }
            for change in changes {
                let meta = ProductMeta {
                    product: self.products[index].product.id(),
                    scheme_type: self.products[index]
                        .product
                        .scheme()
                        .type_name()
                        .to_string(),
                    status: Some(change.to),
                };
                self.events
                    .emit(PlotEvent::new(EventKind::STATUS_CHANGED).with_product(meta));
            }
        }
    }

    fn render_dirty(&mut self, scene: &mut dyn Scene) {
        for index in 0..self.products.len() {
            if !self.products[index].dirty {
                continue;
            }
            let id = self.products[index].product.id();
            let mouse = if self.current == Some(id) {
                self.preview
            } else {
                None
            };
            let ok = self
                .dispatcher
                .render_product(&self.products[index].product, mouse, scene);
            self.products[index].dirty = false;

            // refresh the selection map for this product's body drawables
            self.drawable_owners.retain(|_, pid| *pid != id);
            for drawable in self.dispatcher.last(id) {
                self.drawable_owners.insert(drawable.id, id);
            }
            if ok {
                self.events.emit(
                    PlotEvent::new(EventKind::RENDERED).with_product(self.product_meta(index)),
                );
            }
        }
    }

    fn handle_style(&self, action: ActionState) -> Style {
        let palette = &self.config.handle_palette;
        Style {
            color: match action {
                ActionState::Idle => palette.idle,
                ActionState::Hover => palette.hover,
                ActionState::Active => palette.active,
                ActionState::Operating => palette.operating,
            },
            width: 1.0,
            size: self.config.handle_size,
            filled: true,
        }
    }

    /// Recompute skeleton handle drawables. Only the current, active product
    /// shows handles; everyone else's are cleared.
    fn refresh_handles(&mut self, scene: &mut dyn Scene) {
        for index in 0..self.products.len() {
            let id = self.products[index].product.id();
            let is_current = self.current == Some(id);
            let status = self.products[index].product.status();

            let mut next: Vec<Drawable> = Vec::new();
            if is_current {
                let positions = self.products[index].product.positions();
                let families: Vec<HandleFamily> =
                    self.products[index].product.scheme().skeletons().to_vec();
                for family in families {
                    if !family.enabled_for(status) {
                        continue;
                    }
                    for (i, position) in family.format(&positions).into_iter().enumerate() {
                        let key = (id, family, i);
                        let handle_id = *self
                            .handle_ids
                            .entry(key)
                            .or_insert_with(Drawable::allocate_id);
                        self.handle_owners.insert(handle_id, key);
                        let action = derive_action(
                            self.drag
                                .as_ref()
                                .is_some_and(|d| {
                                    d.product == id && d.family == family && d.index == i
                                }),
                            self.selected_handle == Some(handle_id),
                            self.hovered_handle == Some(handle_id),
                        );
                        next.push(Drawable::with_id(
                            handle_id,
                            Geometry::Point { position },
                            self.handle_style(action),
                        ));
                    }
                }
            }

            if next.is_empty() && self.products[index].handle_drawables.is_empty() {
                continue;
            }
            apply_diff(&self.products[index].handle_drawables, &next, scene);
            // drop id bookkeeping for handles this recompute no longer emits
            // (fewer points, family disabled, product no longer current)
            self.handle_ids
                .retain(|(pid, _, _), hid| *pid != id || next.iter().any(|d| d.id == *hid));
            self.handle_owners
                .retain(|hid, (pid, _, _)| *pid != id || next.iter().any(|d| d.id == *hid));
            self.products[index].handle_drawables = next;
        }
    }

    fn refresh_cursor(&mut self, scene: &mut dyn Scene) {
        let desired = self.defining_current_index().and_then(|index| {
            let product = &self.products[index].product;
            product.scheme().defining_cursor(&product.positions())
        });
        if desired != self.last_cursor {
            scene.set_cursor(desired);
            self.last_cursor = desired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;
    use crate::scheme::SchemeOptions;

    fn registry_with_line() -> SchemeRegistry {
        let mut registry = SchemeRegistry::new();
        crate::schemes::register_builtins(&mut registry);
        registry
    }

    fn zero_grace() -> PlotConfig {
        PlotConfig {
            double_click_grace: Duration::ZERO,
            ..PlotConfig::default()
        }
    }

    #[test]
    fn execute_rejects_unknown_schemes() {
        let mut controller = PlotController::new(SchemeRegistry::new());
        let mut scene = MemoryScene::new();
        assert!(matches!(
            controller.execute("LineString", &mut scene),
            Err(SchemeError::NotFound(_))
        ));
    }

    #[test]
    fn execute_makes_a_defining_current_product() {
        let mut controller = PlotController::with_config(registry_with_line(), zero_grace());
        let mut scene = MemoryScene::new();
        let id = controller.execute("LineString", &mut scene).unwrap();
        assert_eq!(controller.current(), Some(id));
        assert_eq!(
            controller.product(id).unwrap().status(),
            Status::Defining
        );
    }

    #[test]
    fn inline_options_do_not_need_a_registration() {
        let mut controller = PlotController::new(SchemeRegistry::new());
        let mut scene = MemoryScene::new();
        let id = controller
            .execute(SchemeOptions::new("Adhoc").complete(|p| p.len() >= 1), &mut scene)
            .unwrap();
        assert_eq!(controller.current(), Some(id));
    }

    #[test]
    fn cancel_discards_the_defining_product() {
        let mut controller = PlotController::with_config(registry_with_line(), zero_grace());
        let mut scene = MemoryScene::new();
        let id = controller.execute("LineString", &mut scene).unwrap();
        controller.handle_pointer(PointerEvent::left_click(10.0, 10.0), &mut scene);
        controller.handle_pointer(PointerEvent::moved(30.0, 30.0), &mut scene);
        controller.on_frame(&mut scene);
        // captured point + hover preview renders a segment
        assert!(!scene.drawables().is_empty());

        controller.cancel(&mut scene);
        assert_eq!(controller.current(), None);
        assert!(controller.product(id).is_none());
        assert!(scene.drawables().is_empty());
    }

    #[test]
    fn handle_bookkeeping_is_pruned_with_the_handles() {
        let mut controller = PlotController::with_config(registry_with_line(), zero_grace());
        let mut scene = MemoryScene::new();
        controller.execute("LineString", &mut scene).unwrap();
        controller.handle_pointer(PointerEvent::left_click(10.0, 10.0), &mut scene);
        controller.on_frame(&mut scene);
        controller.handle_pointer(PointerEvent::left_click(50.0, 10.0), &mut scene);
        controller.on_frame(&mut scene);
        // two control handles, one open-interval midpoint, one mover
        assert_eq!(controller.handle_ids.len(), 4);
        assert_eq!(controller.handle_owners.len(), 4);

        // deselecting retracts the handles and their id entries with them
        controller.handle_pointer(PointerEvent::left_click(300.0, 300.0), &mut scene);
        controller.on_frame(&mut scene);
        assert!(controller.handle_ids.is_empty());
        assert!(controller.handle_owners.is_empty());

        controller.handle_pointer(PointerEvent::left_click(30.0, 10.0), &mut scene);
        controller.on_frame(&mut scene);
        assert_eq!(controller.handle_ids.len(), 4);
    }

    #[test]
    fn dead_scene_stops_event_processing() {
        let mut controller = PlotController::with_config(registry_with_line(), zero_grace());
        let mut scene = MemoryScene::new();
        let id = controller.execute("LineString", &mut scene).unwrap();
        scene.shut_down();
        controller.handle_pointer(PointerEvent::left_click(10.0, 10.0), &mut scene);
        controller.on_frame(&mut scene);
        assert!(controller.product(id).unwrap().positions().is_empty());
    }
}
