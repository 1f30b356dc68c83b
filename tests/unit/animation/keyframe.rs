use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;
use crate::scene::model::{ElementKind, Location};

fn element() -> TimelineElement {
    TimelineElement {
        priority: 0,
        start_time: 0.0,
        duration: 1000.0,
        location: Location { x: 10.0, y: 20.0 },
        width: 100.0,
        height: 50.0,
        rotation: 90.0,
        opacity: 80.0,
        speed: 1.0,
        animation: BTreeMap::new(),
        localpath: None,
        kind: ElementKind::Shape(Default::default()),
    }
}

fn curve(active: bool, ax: &[[f64; 2]], ay: &[[f64; 2]]) -> AnimationCurve {
    AnimationCurve {
        is_activate: active,
        ax: ax.to_vec(),
        ay: ay.to_vec(),
    }
}

#[test]
fn sample_picks_nearest() {
    let keys = [[0.0, 1.0], [100.0, 2.0], [200.0, 3.0]];
    assert_eq!(sample(&keys, 0.0), Some(1.0));
    assert_eq!(sample(&keys, 49.0), Some(1.0));
    assert_eq!(sample(&keys, 51.0), Some(2.0));
    assert_eq!(sample(&keys, 10_000.0), Some(3.0));
}

#[test]
fn sample_tie_goes_to_first_recorded() {
    assert_eq!(sample(&[[0.0, 1.0], [100.0, 2.0]], 50.0), Some(1.0));
    assert_eq!(sample(&[[100.0, 2.0], [0.0, 1.0]], 50.0), Some(2.0));
}

#[test]
fn sample_misses() {
    assert_eq!(sample(&[], 5.0), None);
    assert_eq!(sample(&[[0.0, 1.0]], -1.0), None);
    assert_eq!(sample(&[[0.0, 1.0]], f64::NAN), None);
}

#[test]
fn overrides_without_curves_uses_static_fields() {
    let el = element();
    let tr = resolve_overrides(&el, 500.0);
    assert_eq!((tr.x, tr.y, tr.scale), (10.0, 20.0, 1.0));
    assert!((tr.rotation_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert!((tr.opacity - 0.8).abs() < 1e-12);
}

#[test]
fn overrides_apply_active_curves_only() {
    let mut el = element();
    el.animation.insert(
        "position".to_owned(),
        curve(true, &[[0.0, 300.0]], &[]),
    );
    el.animation
        .insert("scale".to_owned(), curve(true, &[[0.0, 20.0]], &[]));
    el.animation
        .insert("rotation".to_owned(), curve(false, &[[0.0, 45.0]], &[]));
    el.animation
        .insert("opacity".to_owned(), curve(true, &[[0.0, 150.0]], &[]));

    let tr = resolve_overrides(&el, 0.0);
    assert_eq!(tr.x, 300.0);
    assert_eq!(tr.y, 20.0, "missing y curve keeps the static value");
    assert_eq!(tr.scale, 2.0);
    assert!((tr.rotation_rad - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert_eq!(tr.opacity, 1.0);
}

#[test]
fn overrides_query_element_relative_time() {
    let mut el = element();
    el.animation.insert(
        "opacity".to_owned(),
        curve(true, &[[0.0, 0.0], [1000.0, 100.0]], &[]),
    );
    el.start_time = 2000.0;
    assert_eq!(resolve_overrides(&el, 2900.0).opacity, 1.0);
    assert_eq!(resolve_overrides(&el, 2100.0).opacity, 0.0);
    assert!(
        (resolve_overrides(&el, 1000.0).opacity - 0.8).abs() < 1e-12,
        "before start the static value applies"
    );
}

proptest! {
    #[test]
    fn sample_returns_a_recorded_value(
        keys in prop::collection::vec((0u32..10_000, -1000i32..1000), 1..16),
        query in 0u32..12_000,
    ) {
        let keys: Vec<[f64; 2]> = keys
            .into_iter()
            .map(|(t, v)| [f64::from(t), f64::from(v)])
            .collect();
        let query = f64::from(query);
        let got = sample(&keys, query);
        prop_assert!(got.is_some());
        let got = got.unwrap_or_default();

        let best = keys
            .iter()
            .map(|k| (k[0] - query).abs())
            .fold(f64::INFINITY, f64::min);
        let first = keys
            .iter()
            .find(|k| (k[0] - query).abs() == best)
            .map(|k| k[1]);
        prop_assert_eq!(Some(got), first);
    }
}
