use crate::foundation::error::RenderResult;
use crate::scene::model::TextAlign;

/// Background padding to the left of every line, in pixels.
pub(crate) const BACKGROUND_PADDING: f64 = 12.0;

/// Width of a string in the current text style.
pub(crate) trait TextMeasure {
    fn measure(&mut self, text: &str) -> RenderResult<f64>;
}

impl<F: FnMut(&str) -> RenderResult<f64>> TextMeasure for F {
    fn measure(&mut self, text: &str) -> RenderResult<f64> {
        self(text)
    }
}

/// One wrapped line. `text` keeps its trailing space and `width` includes it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Line {
    pub(crate) text: String,
    pub(crate) width: f64,
}

/// Greedy word wrap on single spaces.
///
/// A word joins the current line when `line + word + " "` measures strictly less than
/// `max_width`; otherwise the current line is committed and the word starts a new one. The last
/// line is always committed, but a word that overflows an empty line does not commit an empty
/// line before it. The first measuring error aborts the wrap.
pub(crate) fn wrap_lines(
    text: &str,
    max_width: f64,
    measure: &mut impl TextMeasure,
) -> RenderResult<Vec<Line>> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ') {
        let test = format!("{line}{word} ");
        if measure.measure(&test)? < max_width {
            line = test;
            continue;
        }
        if !line.is_empty() {
            let width = measure.measure(&line)?;
            lines.push(Line {
                text: std::mem::take(&mut line),
                width,
            });
        }
        line = format!("{word} ");
    }
    let width = measure.measure(&line)?;
    lines.push(Line { text: line, width });
    Ok(lines)
}

/// Left edge of a line of width `line_width` inside a box starting at `left`.
pub(crate) fn line_x(align: TextAlign, left: f64, box_width: f64, line_width: f64) -> f64 {
    match align {
        TextAlign::Left => left,
        TextAlign::Center => left + box_width / 2.0 - line_width / 2.0,
        TextAlign::Right => left + box_width - line_width,
    }
}

/// Baseline of line `k`: the static font size below the box top, then one box height per line.
pub(crate) fn baseline_y(top: f64, font_size: f64, line_height: f64, k: usize) -> f64 {
    top + font_size + k as f64 * line_height
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
