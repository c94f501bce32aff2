//! Sampled-series usage scenarios through the public API.

use sketchplot::{ExtrapolationStrategy, Sample, SampledSeries, TimeInterval, WorldPos};

fn p(x: f64, y: f64) -> WorldPos {
    WorldPos::new(x, y, 0.0)
}

#[test]
fn trajectory_playback_interpolates_between_keyframes() {
    let mut series = SampledSeries::new();
    series.set_samples(vec![
        Sample::new(0.0, vec![p(0.0, 0.0)]),
        Sample::new(4.0, vec![p(40.0, 0.0)]),
        Sample::new(8.0, vec![p(40.0, 40.0)]),
    ]);

    // a playback loop sampling at a fixed step stays on the piecewise path
    for step in 0..=8 {
        let t = step as f64;
        let value = series.get_value(t).unwrap();
        let expected = if t <= 4.0 {
            p(t * 10.0, 0.0)
        } else {
            p(40.0, (t - 4.0) * 10.0)
        };
        assert_eq!(value.positions, vec![expected], "t={t}");
        assert_eq!(value.time, t);
    }
}

#[test]
fn looping_animation_under_cycle_extrapolation() {
    let mut series = SampledSeries::with_strategy(ExtrapolationStrategy::Cycle);
    series.set_samples(vec![
        Sample::new(0.0, vec![p(0.0, 0.0)]),
        Sample::new(2.0, vec![p(20.0, 0.0)]),
    ]);

    // an endless playback clock keeps looping over the sampled span
    let reference = series.get_value(0.5).unwrap();
    for lap in 1..4 {
        let t = 0.5 + lap as f64 * 2.0;
        assert_eq!(
            series.get_value(t).unwrap().positions,
            reference.positions,
            "lap {lap}"
        );
    }
}

#[test]
fn stepwise_interpolator_snaps_to_the_previous_keyframe() {
    let mut series = SampledSeries::new();
    series.set_samples(vec![
        Sample::new(0.0, vec![p(0.0, 0.0)]),
        Sample::new(10.0, vec![p(100.0, 0.0)]),
    ]);
    series.set_interpolator(Box::new(|prev, _next, _proportion| prev.clone()));

    assert_eq!(series.get_value(9.0).unwrap().positions, vec![p(0.0, 0.0)]);
    // exact keyframes bypass the interpolator
    assert_eq!(
        series.get_value(10.0).unwrap().positions,
        vec![p(100.0, 0.0)]
    );
}

#[test]
fn editing_a_recorded_window_renotifies_once_per_mutation() {
    let mut series = SampledSeries::new();
    for t in 0..6 {
        series.set_sample(Sample::new(t as f64, vec![p(t as f64, 0.0)]));
    }
    let rx = series.subscribe();

    // drop the middle of the recording, keyframes at the edges stay
    let removed = series.remove_samples(&TimeInterval::open(0.0, 5.0));
    assert_eq!(removed, 4);
    assert_eq!(series.len(), 2);
    assert_eq!(rx.try_iter().count(), 1);

    // re-keying the gap is an ordinary interior insert
    series.set_sample(Sample::new(2.5, vec![p(-1.0, -1.0)]));
    assert_eq!(
        series.get_value(2.5).unwrap().positions,
        vec![p(-1.0, -1.0)]
    );
    assert_eq!(rx.try_iter().count(), 1);
}
