//! Time-indexed store of point-set samples with pluggable interpolation.
//!
//! A [`SampledSeries`] keeps `(time, positions, derivative)` samples strictly
//! sorted by time and answers [`get_value`](SampledSeries::get_value) queries
//! by locating the bracketing pair and interpolating between them. Queries
//! outside the sampled span are resolved by the series'
//! [`ExtrapolationStrategy`]. Every mutation raises a
//! [`SeriesEvent::DefinitionChanged`] notification to subscribers.

use std::sync::mpsc::Receiver;

use serde::{Deserialize, Serialize};

use crate::geom::{lerp_points, WorldPos};
use crate::signal::Notifier;

/// How queries outside the sampled time span are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrapolationStrategy {
    /// No extrapolation: out-of-range queries return `None`.
    Strict,
    /// Clamp the query time to the nearest boundary sample.
    #[default]
    Nearest,
    /// Wrap the query time into the sampled span.
    Cycle,
}

/// One sample: a point set captured at a point in time, with an optional
/// per-point derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub positions: Vec<WorldPos>,
    pub derivative: Option<Vec<WorldPos>>,
}

impl Sample {
    pub fn new(time: f64, positions: Vec<WorldPos>) -> Self {
        Self {
            time,
            positions,
            derivative: None,
        }
    }

    pub fn with_derivative(time: f64, positions: Vec<WorldPos>, derivative: Vec<WorldPos>) -> Self {
        Self {
            time,
            positions,
            derivative: Some(derivative),
        }
    }
}

/// A time interval with per-endpoint inclusivity, for bulk removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: f64,
    pub stop: f64,
    pub include_start: bool,
    pub include_stop: bool,
}

impl TimeInterval {
    /// Interval including both endpoints.
    pub fn closed(start: f64, stop: f64) -> Self {
        Self {
            start,
            stop,
            include_start: true,
            include_stop: true,
        }
    }

    /// Interval excluding both endpoints.
    pub fn open(start: f64, stop: f64) -> Self {
        Self {
            start,
            stop,
            include_start: false,
            include_stop: false,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        let after_start = if self.include_start {
            t >= self.start
        } else {
            t > self.start
        };
        let before_stop = if self.include_stop {
            t <= self.stop
        } else {
            t < self.stop
        };
        after_start && before_stop
    }
}

/// Notification raised after every series mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesEvent {
    DefinitionChanged,
}

/// Custom interpolation between the bracketing samples.
///
/// Receives `(prev, next, proportion)` with `proportion ∈ (0, 1)`; exact 0/1
/// queries short-circuit to a clone of the boundary sample and never reach
/// the interpolator.
pub type Interpolator = Box<dyn Fn(&Sample, &Sample, f64) -> Sample + Send + Sync>;

/// Sorted, time-indexed samples of a point set.
pub struct SampledSeries {
    samples: Vec<Sample>,
    strategy: ExtrapolationStrategy,
    interpolator: Option<Interpolator>,
    notifier: Notifier<SeriesEvent>,
}

impl SampledSeries {
    pub fn new() -> Self {
        Self::with_strategy(ExtrapolationStrategy::default())
    }

    pub fn with_strategy(strategy: ExtrapolationStrategy) -> Self {
        Self {
            samples: Vec::new(),
            strategy,
            interpolator: None,
            notifier: Notifier::new(),
        }
    }

    pub fn strategy(&self) -> ExtrapolationStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: ExtrapolationStrategy) {
        self.strategy = strategy;
    }

    /// Replace the default pairwise-linear interpolation.
    pub fn set_interpolator(&mut self, interpolator: Interpolator) {
        self.interpolator = Some(interpolator);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// A series with zero samples is constant (always yields nothing).
    pub fn is_constant(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn first_time(&self) -> Option<f64> {
        self.samples.first().map(|s| s.time)
    }

    pub fn last_time(&self) -> Option<f64> {
        self.samples.last().map(|s| s.time)
    }

    /// Identity comparison; there is deliberately no deep equality.
    pub fn same(&self, other: &SampledSeries) -> bool {
        std::ptr::eq(self, other)
    }

    /// Subscribe to mutation notifications.
    pub fn subscribe(&mut self) -> Receiver<SeriesEvent> {
        self.notifier.subscribe()
    }

    /// Query the series at `time`.
    ///
    /// Returns `None` for an empty series and for out-of-range queries under
    /// [`ExtrapolationStrategy::Strict`]. The returned sample carries the
    /// resolved (clamped/wrapped) time.
    pub fn get_value(&self, time: f64) -> Option<Sample> {
        let first = self.first_time()?;
        let last = self.last_time()?;

        let mut t = time;
        if t < first || t > last {
            match self.strategy {
                ExtrapolationStrategy::Strict => return None,
                ExtrapolationStrategy::Nearest => t = t.clamp(first, last),
                ExtrapolationStrategy::Cycle => {
                    let span = last - first;
                    t = if span <= 0.0 {
                        first
                    } else {
                        (t - first).rem_euclid(span) + first
                    };
                }
            }
        }

        // First index with time > t; t is in range so idx >= 1.
        let idx = self.samples.partition_point(|s| s.time <= t);
        let prev_i = idx.saturating_sub(1);
        let next_i = idx.min(self.samples.len() - 1);
        let prev = &self.samples[prev_i];
        let next = &self.samples[next_i];

        let denom = next.time - prev.time;
        let proportion = if denom <= 0.0 {
            0.0
        } else {
            (t - prev.time) / denom
        };

        if proportion <= 0.0 {
            let mut out = prev.clone();
            out.time = t;
            return Some(out);
        }
        if proportion >= 1.0 {
            let mut out = next.clone();
            out.time = t;
            return Some(out);
        }

        Some(match &self.interpolator {
            Some(f) => f(prev, next, proportion),
            None => Sample {
                time: t,
                positions: lerp_points(&prev.positions, &next.positions, proportion),
                derivative: prev.derivative.clone(),
            },
        })
    }

    /// Insert or overwrite a sample.
    ///
    /// A sample at the exact same time is overwritten in place; otherwise the
    /// sample is inserted at its sorted position (interior times included).
    /// Raises one change notification per call, even for identical content.
    pub fn set_sample(&mut self, sample: Sample) {
        match self
            .samples
            .binary_search_by(|s| s.time.total_cmp(&sample.time))
        {
            Ok(i) => self.samples[i] = sample,
            Err(i) => self.samples.insert(i, sample),
        }
        self.notifier.emit(SeriesEvent::DefinitionChanged);
    }

    /// Insert or overwrite a batch of samples. Raises a single change
    /// notification for the whole batch (when non-empty).
    pub fn set_samples(&mut self, samples: Vec<Sample>) {
        if samples.is_empty() {
            return;
        }
        for sample in samples {
            match self
                .samples
                .binary_search_by(|s| s.time.total_cmp(&sample.time))
            {
                Ok(i) => self.samples[i] = sample,
                Err(i) => self.samples.insert(i, sample),
            }
        }
        self.notifier.emit(SeriesEvent::DefinitionChanged);
    }

    /// Remove the sample at exactly `time`. Notifies only when a sample was
    /// actually removed.
    pub fn remove_sample(&mut self, time: f64) -> bool {
        match self.samples.binary_search_by(|s| s.time.total_cmp(&time)) {
            Ok(i) => {
                self.samples.remove(i);
                self.notifier.emit(SeriesEvent::DefinitionChanged);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove all samples whose time falls within `interval`, honoring its
    /// inclusivity flags. Returns the removed count; notifies only when
    /// non-zero.
    pub fn remove_samples(&mut self, interval: &TimeInterval) -> usize {
        let before = self.samples.len();
        self.samples.retain(|s| !interval.contains(s.time));
        let removed = before - self.samples.len();
        if removed > 0 {
            self.notifier.emit(SeriesEvent::DefinitionChanged);
        }
        removed
    }
}

impl Default for SampledSeries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> WorldPos {
        WorldPos::new(x, y, 0.0)
    }

    fn two_sample_series() -> SampledSeries {
        let mut s = SampledSeries::new();
        s.set_sample(Sample::new(0.0, vec![p(0.0, 0.0), p(10.0, 0.0)]));
        s.set_sample(Sample::new(10.0, vec![p(0.0, 10.0), p(10.0, 10.0)]));
        s
    }

    #[test]
    fn empty_series_yields_nothing() {
        let s = SampledSeries::new();
        assert!(s.is_constant());
        assert!(s.get_value(0.0).is_none());
    }

    #[test]
    fn boundary_queries_match_samples_exactly() {
        let s = two_sample_series();
        let first = s.get_value(0.0).unwrap();
        assert_eq!(first.positions, vec![p(0.0, 0.0), p(10.0, 0.0)]);
        let last = s.get_value(10.0).unwrap();
        assert_eq!(last.positions, vec![p(0.0, 10.0), p(10.0, 10.0)]);
    }

    #[test]
    fn interior_queries_interpolate_linearly() {
        let s = two_sample_series();
        let v = s.get_value(2.5).unwrap();
        assert_eq!(v.positions, vec![p(0.0, 2.5), p(10.0, 2.5)]);
        let v = s.get_value(7.5).unwrap();
        assert_eq!(v.positions, vec![p(0.0, 7.5), p(10.0, 7.5)]);
    }

    #[test]
    fn longer_next_sample_passes_surplus_points_through() {
        let mut s = SampledSeries::new();
        s.set_sample(Sample::new(0.0, vec![p(0.0, 0.0)]));
        s.set_sample(Sample::new(2.0, vec![p(2.0, 0.0), p(5.0, 5.0)]));
        let v = s.get_value(1.0).unwrap();
        assert_eq!(v.positions, vec![p(1.0, 0.0), p(5.0, 5.0)]);
    }

    #[test]
    fn derivative_of_prev_is_carried() {
        let mut s = SampledSeries::new();
        s.set_sample(Sample::with_derivative(
            0.0,
            vec![p(0.0, 0.0)],
            vec![p(1.0, 0.0)],
        ));
        s.set_sample(Sample::new(2.0, vec![p(2.0, 0.0)]));
        let v = s.get_value(1.0).unwrap();
        assert_eq!(v.derivative, Some(vec![p(1.0, 0.0)]));
    }

    #[test]
    fn strict_strategy_refuses_extrapolation() {
        let mut s = two_sample_series();
        s.set_strategy(ExtrapolationStrategy::Strict);
        assert!(s.get_value(-1.0).is_none());
        assert!(s.get_value(11.0).is_none());
        assert!(s.get_value(5.0).is_some());
    }

    #[test]
    fn nearest_strategy_clamps_to_boundaries() {
        let s = two_sample_series();
        assert_eq!(s.strategy(), ExtrapolationStrategy::Nearest);
        let v = s.get_value(-5.0).unwrap();
        assert_eq!(v.positions, vec![p(0.0, 0.0), p(10.0, 0.0)]);
        let v = s.get_value(25.0).unwrap();
        assert_eq!(v.positions, vec![p(0.0, 10.0), p(10.0, 10.0)]);
    }

    #[test]
    fn cycle_strategy_wraps_into_span() {
        let mut s = two_sample_series();
        s.set_strategy(ExtrapolationStrategy::Cycle);
        // T1 + k*D + delta == T0 + delta for k >= 0
        for k in 0..3 {
            let delta = 2.5;
            let wrapped = s.get_value(10.0 + k as f64 * 10.0 + delta).unwrap();
            let direct = s.get_value(delta).unwrap();
            assert_eq!(wrapped.positions, direct.positions, "k={k}");
        }
        // negative side wraps too
        let v = s.get_value(-2.5).unwrap();
        assert_eq!(v.positions, s.get_value(7.5).unwrap().positions);
    }

    #[test]
    fn single_sample_series_under_cycle() {
        let mut s = SampledSeries::with_strategy(ExtrapolationStrategy::Cycle);
        s.set_sample(Sample::new(5.0, vec![p(1.0, 1.0)]));
        let v = s.get_value(99.0).unwrap();
        assert_eq!(v.positions, vec![p(1.0, 1.0)]);
    }

    #[test]
    fn set_sample_overwrites_in_place() {
        let mut s = two_sample_series();
        s.set_sample(Sample::new(0.0, vec![p(9.0, 9.0)]));
        assert_eq!(s.len(), 2);
        assert_eq!(s.get_value(0.0).unwrap().positions, vec![p(9.0, 9.0)]);
    }

    #[test]
    fn interior_insert_preserves_order() {
        let mut s = two_sample_series();
        s.set_sample(Sample::new(5.0, vec![p(5.0, 5.0)]));
        assert_eq!(s.len(), 3);
        let times: Vec<f64> = s.samples().iter().map(|x| x.time).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0]);
        assert_eq!(s.get_value(5.0).unwrap().positions, vec![p(5.0, 5.0)]);
    }

    #[test]
    fn every_set_sample_notifies_even_when_identical() {
        let mut s = SampledSeries::new();
        let rx = s.subscribe();
        let sample = Sample::new(0.0, vec![p(1.0, 2.0)]);
        s.set_sample(sample.clone());
        s.set_sample(sample);
        assert_eq!(s.len(), 1);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn removal_notifies_only_on_actual_removal() {
        let mut s = two_sample_series();
        let rx = s.subscribe();
        assert!(!s.remove_sample(4.2));
        assert_eq!(rx.try_iter().count(), 0);
        assert!(s.remove_sample(0.0));
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn interval_removal_honors_inclusivity() {
        let mut s = SampledSeries::new();
        for t in [0.0, 1.0, 2.0, 3.0] {
            s.set_sample(Sample::new(t, vec![p(t, 0.0)]));
        }
        let removed = s.remove_samples(&TimeInterval::open(1.0, 3.0));
        assert_eq!(removed, 1); // only t=2
        let times: Vec<f64> = s.samples().iter().map(|x| x.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 3.0]);

        let removed = s.remove_samples(&TimeInterval::closed(1.0, 3.0));
        assert_eq!(removed, 2);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn set_samples_batch_notifies_once() {
        let mut s = SampledSeries::new();
        let rx = s.subscribe();
        s.set_samples(vec![
            Sample::new(1.0, vec![p(1.0, 0.0)]),
            Sample::new(0.0, vec![p(0.0, 0.0)]),
        ]);
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(s.first_time(), Some(0.0));
        s.set_samples(Vec::new());
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn custom_interpolator_takes_over_interior_queries() {
        let mut s = two_sample_series();
        s.set_interpolator(Box::new(|prev, _next, _t| Sample {
            time: prev.time,
            positions: vec![p(-1.0, -1.0)],
            derivative: None,
        }));
        assert_eq!(s.get_value(5.0).unwrap().positions, vec![p(-1.0, -1.0)]);
        // boundary short-circuit bypasses the interpolator
        assert_eq!(
            s.get_value(0.0).unwrap().positions,
            vec![p(0.0, 0.0), p(10.0, 0.0)]
        );
    }

    #[test]
    fn same_is_identity_not_content() {
        let a = two_sample_series();
        let b = two_sample_series();
        assert!(a.same(&a));
        assert!(!a.same(&b));
    }
}
