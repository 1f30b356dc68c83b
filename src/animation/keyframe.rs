use std::f64::consts::PI;

use crate::scene::model::{AnimationCurve, TimelineElement};

/// Value of the sample whose time is nearest to `query_ms`.
///
/// Samples are scanned in recorded order and only a strictly closer sample replaces the current
/// best, so the first of two equidistant samples wins. Returns `None` for an empty curve and for
/// negative or non-finite query times.
pub(crate) fn sample(keys: &[[f64; 2]], query_ms: f64) -> Option<f64> {
    if !query_ms.is_finite() || query_ms < 0.0 {
        return None;
    }
    let mut best: Option<(f64, f64)> = None;
    for &[time, value] in keys {
        let dist = (time - query_ms).abs();
        match best {
            Some((best_dist, _)) if dist >= best_dist => {}
            _ => best = Some((dist, value)),
        }
    }
    best.map(|(_, value)| value)
}

/// Element transform after keyframe overrides, in canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ResolvedTransform {
    /// Left edge.
    pub(crate) x: f64,
    /// Top edge.
    pub(crate) y: f64,
    /// Uniform scale factor around the box center.
    pub(crate) scale: f64,
    /// Rotation in radians.
    pub(crate) rotation_rad: f64,
    /// Opacity in `0..=1`.
    pub(crate) opacity: f64,
}

fn active_curve<'a>(el: &'a TimelineElement, property: &str) -> Option<&'a AnimationCurve> {
    el.animation.get(property).filter(|curve| curve.is_activate)
}

/// Resolve the static fields of `el` overridden by its active curves at `t_ms`.
///
/// Curves are queried at `t_ms - el.start_time`, the element's own start even for text that
/// follows a parent. Position samples override each axis independently, scale
/// samples are tenths, rotation samples are degrees and opacity samples are percent.
pub(crate) fn resolve_overrides(el: &TimelineElement, t_ms: f64) -> ResolvedTransform {
    let local = t_ms - el.start_time;
    let mut out = ResolvedTransform {
        x: el.location.x,
        y: el.location.y,
        scale: 1.0,
        rotation_rad: el.rotation * PI / 180.0,
        opacity: el.opacity / 100.0,
    };

    if let Some(curve) = active_curve(el, "position") {
        if let Some(x) = sample(&curve.ax, local) {
            out.x = x;
        }
        if let Some(y) = sample(&curve.ay, local) {
            out.y = y;
        }
    }
    if let Some(v) = active_curve(el, "scale").and_then(|c| sample(&c.ax, local)) {
        out.scale = v / 10.0;
    }
    if let Some(v) = active_curve(el, "rotation").and_then(|c| sample(&c.ax, local)) {
        out.rotation_rad = v * PI / 180.0;
    }
    if let Some(v) = active_curve(el, "opacity").and_then(|c| sample(&c.ax, local)) {
        out.opacity = v / 100.0;
    }
    out.opacity = out.opacity.clamp(0.0, 1.0);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
