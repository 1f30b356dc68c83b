use std::path::{Path, PathBuf};

use crate::assets::color::parse_color;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{RenderError, RenderResult};
use crate::scene::model::{TextAlign, TextProps};
use crate::text::engine::TextEngine;
use crate::text::layout::{BACKGROUND_PADDING, baseline_y, line_x, wrap_lines};

/// Horizontal shear of synthesized italics.
const ITALIC_SKEW: f64 = -0.2;

/// Synthesized bold stroke width as a fraction of the font size.
const BOLD_STROKE_RATIO: f32 = 1.0 / 24.0;

/// Element box the text is laid out in, canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TextBox {
    pub(crate) left: f64,
    pub(crate) top: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Text style resolved once per frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextStyle {
    pub(crate) font: PathBuf,
    /// Drawing size (static size times any scale override).
    pub(crate) size: f32,
    /// Static size, used for baseline placement.
    pub(crate) static_size: f64,
    pub(crate) letter_spacing: f32,
    pub(crate) fill: Rgba8,
    pub(crate) align: TextAlign,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) outline: Option<(f32, Rgba8)>,
    pub(crate) background: Option<Rgba8>,
}

fn color(field: &str, s: &str) -> RenderResult<Rgba8> {
    parse_color(s).map_err(|e| RenderError::validation(format!("{field}: {e}")))
}

impl TextStyle {
    pub(crate) fn resolve(props: &TextProps, font: &Path, scale: f64) -> RenderResult<Self> {
        let outline = if props.options.outline.enable && props.options.outline.size > 0.0 {
            Some((
                props.options.outline.size as f32,
                color("outline.color", &props.options.outline.color)?,
            ))
        } else {
            None
        };
        let background = if props.background.enable {
            Some(color("background.color", &props.background.color)?)
        } else {
            None
        };
        Ok(Self {
            font: font.to_path_buf(),
            size: (props.fontsize * scale) as f32,
            static_size: props.fontsize,
            letter_spacing: props.letter_spacing as f32,
            fill: color("textcolor", &props.textcolor)?,
            align: props.options.align,
            bold: props.options.is_bold,
            italic: props.options.is_italic,
            outline,
            background,
        })
    }
}

fn paint_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    style: &TextStyle,
    glyphs: &[vello_cpu::Glyph],
    stroke: bool,
) {
    let mut run = ctx.glyph_run(font).font_size(style.size);
    if style.italic {
        run = run.glyph_transform(vello_cpu::kurbo::Affine::skew(ITALIC_SKEW, 0.0));
    }
    if stroke {
        run.stroke_glyphs(glyphs.iter().copied());
    } else {
        run.fill_glyphs(glyphs.iter().copied());
    }
}

/// Wrap and draw `text` inside `bx` with the context's current transform.
///
/// Backgrounds for every line go first, then per line the outline stroke, the fill and the
/// synthesized bold stroke.
pub(crate) fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextEngine,
    text: &str,
    style: &TextStyle,
    bx: TextBox,
) -> RenderResult<()> {
    let font = engine.font_data(&style.font)?;
    let mut measure = |s: &str| {
        engine
            .shape(&style.font, s, style.size, style.letter_spacing)
            .map(|shaped| shaped.width)
    };
    let lines = wrap_lines(text, bx.width, &mut measure)?;

    if let Some(bg) = style.background {
        ctx.set_paint(bg.to_cpu_color());
        for (k, line) in lines.iter().enumerate() {
            let x = line_x(style.align, bx.left, bx.width, line.width) - BACKGROUND_PADDING;
            let y = bx.top + k as f64 * bx.height;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                x,
                y,
                x + line.width + BACKGROUND_PADDING,
                y + bx.height,
            ));
        }
    }

    for (k, line) in lines.iter().enumerate() {
        let shaped = engine.shape(&style.font, &line.text, style.size, style.letter_spacing)?;
        let x = line_x(style.align, bx.left, bx.width, line.width) as f32;
        let y = baseline_y(bx.top, style.static_size, bx.height, k) as f32;
        let glyphs: Vec<vello_cpu::Glyph> = shaped
            .glyphs
            .iter()
            .map(|g| vello_cpu::Glyph {
                id: g.id,
                x: x + g.x,
                y: y + g.y,
            })
            .collect();

        if let Some((width, outline)) = style.outline {
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(width)));
            ctx.set_paint(outline.to_cpu_color());
            paint_glyphs(ctx, &font, style, &glyphs, true);
        }
        ctx.set_paint(style.fill.to_cpu_color());
        paint_glyphs(ctx, &font, style, &glyphs, false);
        if style.bold {
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(
                style.size * BOLD_STROKE_RATIO,
            )));
            paint_glyphs(ctx, &font, style, &glyphs, true);
        }
    }
    Ok(())
}
