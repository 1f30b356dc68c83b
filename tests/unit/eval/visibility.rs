use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;
use crate::foundation::core::FrameIndex;
use crate::scene::model::{Location, TextProps, VideoProps};

fn element(kind: ElementKind, start: f64, duration: f64) -> TimelineElement {
    TimelineElement {
        priority: 0,
        start_time: start,
        duration,
        location: Location::default(),
        width: 10.0,
        height: 10.0,
        rotation: 0.0,
        opacity: 100.0,
        speed: 1.0,
        animation: BTreeMap::new(),
        localpath: Some("x".to_owned()),
        kind,
    }
}

fn video(start: f64, duration: f64, speed: f64, trim: Option<Trim>) -> TimelineElement {
    let mut el = element(
        ElementKind::Video(VideoProps {
            trim,
            ..VideoProps::default()
        }),
        start,
        duration,
    );
    el.speed = speed;
    el
}

#[test]
fn static_window_is_half_open() {
    let el = element(ElementKind::Image, 1000.0, 500.0);
    assert!(!is_visible_at(&el, 1000.0, 999.999));
    assert!(is_visible_at(&el, 1000.0, 1000.0));
    assert!(is_visible_at(&el, 1000.0, 1499.9));
    assert!(!is_visible_at(&el, 1000.0, 1500.0));
}

#[test]
fn dynamic_window_is_scaled_by_speed() {
    let el = video(0.0, 1000.0, 2.0, None);
    assert!(is_visible_at(&el, 0.0, 499.0));
    assert!(!is_visible_at(&el, 0.0, 500.0));
}

#[test]
fn video_trim_restricts_window() {
    let el = video(
        100.0,
        1000.0,
        1.0,
        Some(Trim {
            start_time: 200.0,
            end_time: 400.0,
        }),
    );
    assert!(!is_visible_at(&el, 100.0, 250.0));
    assert!(is_visible_at(&el, 100.0, 300.0));
    assert!(is_visible_at(&el, 100.0, 499.0));
    assert!(!is_visible_at(&el, 100.0, 500.0));
}

#[test]
fn text_follows_parent_start() {
    let mut timeline = Timeline::new();
    timeline.insert("clip".to_owned(), video(2000.0, 1000.0, 1.0, None));
    let caption = element(
        ElementKind::Text(TextProps {
            parent_key: "clip".to_owned(),
            ..TextProps::default()
        }),
        100.0,
        300.0,
    );
    assert_eq!(effective_start(&timeline, &caption), 2100.0);
    timeline.insert("caption".to_owned(), caption);

    let ids = |t: f64| -> Vec<String> {
        active_layers(&timeline, t)
            .iter()
            .map(|l| l.id.to_owned())
            .collect()
    };
    assert_eq!(ids(150.0), Vec::<String>::new());
    assert_eq!(ids(2150.0), vec!["clip".to_owned(), "caption".to_owned()]);
}

#[test]
fn audio_is_never_a_layer() {
    let mut timeline = Timeline::new();
    timeline.insert(
        "a".to_owned(),
        element(ElementKind::Audio(Default::default()), 0.0, 1000.0),
    );
    assert!(active_layers(&timeline, 10.0).is_empty());
}

#[test]
fn layers_sort_by_priority_then_id() {
    let mut timeline = Timeline::new();
    for (id, prio) in [("c", 3), ("a", 1), ("b", 2), ("aa", 2)] {
        let mut el = element(ElementKind::Image, 0.0, 100.0);
        el.priority = prio;
        timeline.insert(id.to_owned(), el);
    }
    let order: Vec<&str> = active_layers(&timeline, 0.0).iter().map(|l| l.id).collect();
    assert_eq!(order, vec!["a", "aa", "b", "c"]);
}

proptest! {
    #[test]
    fn static_membership_at_boundaries(start in 0u32..10_000, duration in 1u32..10_000) {
        let (start, duration) = (f64::from(start), f64::from(duration));
        let el = element(ElementKind::Shape(Default::default()), start, duration);
        prop_assert!(is_visible_at(&el, start, start));
        prop_assert!(is_visible_at(&el, start, start + duration / 2.0));
        prop_assert!(!is_visible_at(&el, start, start + duration));
        prop_assert!(!is_visible_at(&el, start, start - 1.0));
    }

    #[test]
    fn video_membership_matches_window_intersection(
        start in 0u32..5_000,
        duration in 1u32..5_000,
        speed_q in 1u32..16,
        trim_a in 0u32..5_000,
        trim_len in 0u32..5_000,
        probe in 0u32..12_000,
    ) {
        let start = f64::from(start);
        let duration = f64::from(duration);
        let speed = f64::from(speed_q) / 4.0;
        let trim = Trim { start_time: f64::from(trim_a), end_time: f64::from(trim_a + trim_len) };
        let el = video(start, duration, speed, Some(trim));

        let in_window = |t: f64| {
            t >= start
                && t < start + duration / speed
                && t >= start + trim.start_time
                && t < start + trim.end_time
        };
        let mid = start + trim.start_time + f64::from(trim_len) / 2.0;
        for t in [
            start,
            start + duration / speed,
            start + trim.start_time,
            start + trim.end_time,
            mid,
            f64::from(probe),
        ] {
            prop_assert_eq!(is_visible_at(&el, start, t), in_window(t));
        }
    }

    #[test]
    fn active_set_matches_invariant_per_frame(
        specs in prop::collection::vec((0u32..2_000, 0u32..2_000, -5i64..5), 1..8),
        frame in 0u64..180,
    ) {
        let mut timeline = Timeline::new();
        for (i, (start, duration, priority)) in specs.iter().enumerate() {
            let mut el = element(ElementKind::Image, f64::from(*start), f64::from(*duration));
            el.priority = *priority;
            timeline.insert(format!("e{i}"), el);
        }
        let t = FrameIndex(frame).time_ms();
        let layers = active_layers(&timeline, t);

        let expected = timeline
            .values()
            .filter(|el| t >= el.start_time && t < el.start_time + el.duration)
            .count();
        prop_assert_eq!(layers.len(), expected);
        for pair in layers.windows(2) {
            prop_assert!(pair[0].element.priority <= pair[1].element.priority);
        }
    }
}
