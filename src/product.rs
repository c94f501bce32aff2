//! Products: one in-progress or completed plot instance.
//!
//! A [`Product`] binds one resolved [`Scheme`] to its own
//! [`SampledSeries`]. Capture mutations (append, pop) all flow through
//! `set_sample` on the series, so series subscribers see every change.
//! Status is mutated exclusively through [`Product::set_status`], which
//! raises a status-change notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geom::WorldPos;
use crate::scheme::{Scheme, SchemeRef};
use crate::series::{Sample, SampledSeries};
use crate::signal::Notifier;

/// Numeric identifier of a product, unique within the process.
pub type ProductId = u64;

/// Lifecycle status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Constructed but not capturing or editable.
    Idle,
    /// Capture in progress: clicks append points.
    Defining,
    /// Capture complete: skeleton handles are live.
    Active,
    /// Hidden from interaction.
    Disabled,
}

/// Payload of a status-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: Status,
    pub to: Status,
}

/// Construction options for [`Product`].
pub struct ProductOptions {
    pub scheme: SchemeRef,
    /// Caller-provided id; generated when absent.
    pub id: Option<ProductId>,
    /// Initial captured positions, for adopting pre-existing geometry.
    pub seed: Vec<WorldPos>,
}

impl ProductOptions {
    pub fn new(scheme: impl Into<SchemeRef>) -> Self {
        Self {
            scheme: scheme.into(),
            id: None,
            seed: Vec::new(),
        }
    }

    pub fn id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn seed(mut self, positions: Vec<WorldPos>) -> Self {
        self.seed = positions;
        self
    }
}

fn next_product_id() -> ProductId {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// One plot instance: a scheme bound to its own sampled series.
pub struct Product {
    id: ProductId,
    scheme: Arc<Scheme>,
    series: SampledSeries,
    status: Status,
    capture_time: f64,
    status_notifier: Notifier<StatusChange>,
}

impl Product {
    /// Build a product in `Defining` status. `seed` positions, when present,
    /// become the initial sample at the capture time.
    pub fn new(scheme: Arc<Scheme>, id: Option<ProductId>, seed: Vec<WorldPos>) -> Self {
        let mut product = Self {
            id: id.unwrap_or_else(next_product_id),
            scheme,
            series: SampledSeries::new(),
            status: Status::Defining,
            capture_time: 0.0,
            status_notifier: Notifier::new(),
        };
        if !seed.is_empty() {
            let time = product.capture_time;
            product.series.set_sample(Sample::new(time, seed));
        }
        product
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn scheme(&self) -> &Arc<Scheme> {
        &self.scheme
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_defining(&self) -> bool {
        self.status == Status::Defining
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// The time at which capture samples are recorded.
    pub fn capture_time(&self) -> f64 {
        self.capture_time
    }

    pub fn series(&self) -> &SampledSeries {
        &self.series
    }

    pub fn series_mut(&mut self) -> &mut SampledSeries {
        &mut self.series
    }

    /// Positions captured so far (the series value at the capture time).
    pub fn positions(&self) -> Vec<WorldPos> {
        self.series
            .get_value(self.capture_time)
            .map(|s| s.positions)
            .unwrap_or_default()
    }

    /// The only sanctioned status mutation path. No-op (and no notification)
    /// when the status is unchanged; returns whether a transition happened.
    pub fn set_status(&mut self, to: Status) -> bool {
        if self.status == to {
            return false;
        }
        let from = self.status;
        self.status = to;
        debug!(product = self.id, ?from, ?to, "product status changed");
        self.status_notifier.emit(StatusChange { from, to });
        true
    }

    /// Subscribe to status-change notifications.
    pub fn subscribe_status(&mut self) -> Receiver<StatusChange> {
        self.status_notifier.subscribe()
    }

    /// Append one captured point at the capture time.
    pub fn append_point(&mut self, position: WorldPos) {
        let mut positions = self.positions();
        positions.push(position);
        let time = self.capture_time;
        self.series.set_sample(Sample::new(time, positions));
    }

    /// Remove the most recently captured point. No-op on an empty capture.
    pub fn pop_point(&mut self) -> Option<WorldPos> {
        let mut positions = self.positions();
        let popped = positions.pop()?;
        let time = self.capture_time;
        self.series.set_sample(Sample::new(time, positions));
        Some(popped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::SchemeOptions;

    fn product() -> Product {
        Product::new(Arc::new(SchemeOptions::new("T").build()), None, Vec::new())
    }

    fn p(x: f64, y: f64) -> WorldPos {
        WorldPos::new(x, y, 0.0)
    }

    #[test]
    fn starts_defining_with_unique_ids() {
        let a = product();
        let b = product();
        assert_eq!(a.status(), Status::Defining);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn caller_provided_id_is_kept() {
        let scheme = Arc::new(SchemeOptions::new("T").build());
        let prod = Product::new(scheme, Some(4242), Vec::new());
        assert_eq!(prod.id(), 4242);
    }

    #[test]
    fn seed_positions_become_initial_sample() {
        let scheme = Arc::new(SchemeOptions::new("T").build());
        let prod = Product::new(scheme, None, vec![p(1.0, 2.0)]);
        assert_eq!(prod.positions(), vec![p(1.0, 2.0)]);
    }

    #[test]
    fn append_and_pop_round_trip_through_the_series() {
        let mut prod = product();
        let rx = prod.series_mut().subscribe();
        prod.append_point(p(1.0, 1.0));
        prod.append_point(p(2.0, 2.0));
        assert_eq!(prod.positions().len(), 2);
        assert_eq!(prod.pop_point(), Some(p(2.0, 2.0)));
        assert_eq!(prod.positions(), vec![p(1.0, 1.0)]);
        // every mutation went through set_sample and notified
        assert_eq!(rx.try_iter().count(), 3);
        // popping the last point and then an empty capture
        assert_eq!(prod.pop_point(), Some(p(1.0, 1.0)));
        assert_eq!(prod.pop_point(), None);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn set_status_no_ops_on_same_value() {
        let mut prod = product();
        let rx = prod.subscribe_status();
        assert!(!prod.set_status(Status::Defining));
        assert!(prod.set_status(Status::Active));
        assert!(!prod.set_status(Status::Active));
        let changes: Vec<StatusChange> = rx.try_iter().collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, Status::Defining);
        assert_eq!(changes[0].to, Status::Active);
    }
}
