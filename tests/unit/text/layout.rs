use proptest::prelude::*;

use super::*;
use crate::foundation::error::RenderError;

/// Every char advances 10px.
fn width(s: &str) -> f64 {
    s.chars().count() as f64 * 10.0
}

fn fixed(s: &str) -> RenderResult<f64> {
    Ok(width(s))
}

fn texts(lines: &[Line]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

#[test]
fn short_text_stays_on_one_line() {
    let lines = wrap_lines("ab cd", 100.0, &mut fixed).unwrap();
    assert_eq!(texts(&lines), vec!["ab cd "]);
    assert_eq!(lines[0].width, 60.0);
}

#[test]
fn overflow_commits_previous_line() {
    let lines = wrap_lines("aaa bbb ccc", 90.0, &mut fixed).unwrap();
    assert_eq!(texts(&lines), vec!["aaa bbb ", "ccc "]);
    assert_eq!(lines[0].width, 80.0);
}

#[test]
fn boundary_at_exactly_max_width_wraps() {
    // "aaa bbbb " is 90px: equal is not less, so it wraps.
    let lines = wrap_lines("aaa bbbb", 90.0, &mut fixed).unwrap();
    assert_eq!(texts(&lines), vec!["aaa ", "bbbb "]);
    let lines = wrap_lines("aaa bbbb", 90.1, &mut fixed).unwrap();
    assert_eq!(texts(&lines), vec!["aaa bbbb "]);
}

#[test]
fn leading_overflow_does_not_emit_empty_line() {
    let lines = wrap_lines("toolongword x", 50.0, &mut fixed).unwrap();
    assert_eq!(texts(&lines), vec!["toolongword ", "x "]);
}

#[test]
fn empty_text_yields_one_line() {
    let lines = wrap_lines("", 50.0, &mut fixed).unwrap();
    assert_eq!(texts(&lines), vec![" "]);
}

#[test]
fn measuring_errors_are_propagated() {
    let mut calls = 0;
    let mut failing = |s: &str| {
        calls += 1;
        if calls > 1 {
            Err(RenderError::asset("font 'gone.ttf' not registered"))
        } else {
            fixed(s)
        }
    };
    let err = wrap_lines("aaa bbb ccc", 1000.0, &mut failing).unwrap_err();
    assert!(matches!(err, RenderError::Asset(_)));
}

#[test]
fn alignment_offsets() {
    assert_eq!(line_x(TextAlign::Left, 10.0, 100.0, 40.0), 10.0);
    assert_eq!(line_x(TextAlign::Center, 10.0, 100.0, 40.0), 40.0);
    assert_eq!(line_x(TextAlign::Right, 10.0, 100.0, 40.0), 70.0);
}

#[test]
fn baselines_step_by_box_height() {
    assert_eq!(baseline_y(100.0, 24.0, 30.0, 0), 124.0);
    assert_eq!(baseline_y(100.0, 24.0, 30.0, 2), 184.0);
}

proptest! {
    #[test]
    fn fitting_words_wrap_without_overflow(
        words in prop::collection::vec(1usize..6, 2..12),
        extra in 1u32..40,
    ) {
        let longest = words.iter().copied().max().unwrap_or(1);
        // Every "word " fits; the whole text does not.
        let max_width = (longest as f64 + 1.0) * 10.0 + f64::from(extra) / 10.0;
        let text = words
            .iter()
            .map(|&n| "x".repeat(n))
            .collect::<Vec<_>>()
            .join(" ");
        prop_assume!(width(&format!("{text} ")) >= max_width);

        let lines = wrap_lines(&text, max_width, &mut fixed).unwrap();
        prop_assert!(lines.len() >= 2);
        for line in &lines {
            prop_assert!(line.width < max_width);
            prop_assert!(!line.text.trim().is_empty());
        }
        let rejoined = lines
            .iter()
            .map(|l| l.text.trim_end())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(rejoined, text);
    }
}
