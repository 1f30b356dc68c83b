use crate::scene::model::{ElementKind, Timeline, TimelineElement, Trim};

/// An element selected for drawing in one frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Layer<'a> {
    pub(crate) id: &'a str,
    pub(crate) element: &'a TimelineElement,
    /// Effective start on the output timeline (parent offset applied).
    pub(crate) start: f64,
}

/// Start time including the parent offset of captions that follow another element.
pub(crate) fn effective_start(timeline: &Timeline, el: &TimelineElement) -> f64 {
    let offset = match &el.kind {
        ElementKind::Text(text) => text
            .parent()
            .and_then(|parent| timeline.get(parent))
            .map_or(0.0, |parent| parent.start_time),
        _ => 0.0,
    };
    el.start_time + offset
}

/// Trim window of a clip, defaulting to its whole duration.
pub(crate) fn trim_or_full(trim: Option<Trim>, duration: f64) -> Trim {
    trim.unwrap_or(Trim {
        start_time: 0.0,
        end_time: duration,
    })
}

/// Whether `el`, starting at `start`, is visible at timeline time `t_ms`.
///
/// Static kinds: `[start, start + duration)`. Dynamic kinds: `[start, start + duration / speed)`,
/// and video additionally `[start + trim.start, start + trim.end)`.
pub(crate) fn is_visible_at(el: &TimelineElement, start: f64, t_ms: f64) -> bool {
    let end = if el.kind.is_dynamic() {
        start + el.duration / el.speed
    } else {
        start + el.duration
    };
    if !(t_ms >= start && t_ms < end) {
        return false;
    }
    if let ElementKind::Video(video) = &el.kind {
        let trim = trim_or_full(video.trim, el.duration);
        return t_ms >= start + trim.start_time && t_ms < start + trim.end_time;
    }
    true
}

/// Drawable layers active at `t_ms`, bottom-to-top.
///
/// Audio is never drawn. Sorted by ascending priority; the sort is stable over the id-ordered
/// map, so equal priorities paint in ascending id order.
pub(crate) fn active_layers(timeline: &Timeline, t_ms: f64) -> Vec<Layer<'_>> {
    let mut layers: Vec<Layer<'_>> = timeline
        .iter()
        .filter(|(_, el)| !matches!(el.kind, ElementKind::Audio(_)))
        .filter_map(|(id, el)| {
            let start = effective_start(timeline, el);
            is_visible_at(el, start, t_ms).then_some(Layer {
                id: id.as_str(),
                element: el,
                start,
            })
        })
        .collect();
    layers.sort_by_key(|layer| layer.element.priority);
    layers
}

#[cfg(test)]
#[path = "../../tests/unit/eval/visibility.rs"]
mod tests;
