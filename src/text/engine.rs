use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{RenderError, RenderResult};

struct Face {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// One shaped run of text on a single line.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShapedLine {
    /// Advance width including trailing whitespace and letter spacing.
    pub(crate) width: f64,
    /// Glyphs with `x` from the line start and `y` from the baseline.
    pub(crate) glyphs: Vec<vello_cpu::Glyph>,
}

/// Parley shaping over the fonts registered for one session.
pub(crate) struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    faces: HashMap<PathBuf, Face>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: HashMap::new(),
        }
    }

    /// Register the font file at `path`. Registering the same path twice is a no-op.
    pub(crate) fn register(&mut self, path: &Path, bytes: &Arc<Vec<u8>>) -> RenderResult<()> {
        if self.faces.contains_key(path) {
            return Ok(());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            RenderError::asset(format!("no font families in '{}'", path.display()))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                RenderError::asset(format!("font '{}' has no family name", path.display()))
            })?
            .to_string();
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        tracing::debug!(path = %path.display(), family = %family, "registered font");
        self.faces.insert(path.to_path_buf(), Face { family, data });
        Ok(())
    }

    /// Paint handle for glyphs of the font at `path`.
    pub(crate) fn font_data(&self, path: &Path) -> RenderResult<vello_cpu::peniko::FontData> {
        self.faces
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| RenderError::asset(format!("font '{}' not registered", path.display())))
    }

    /// Shape `text` as one unbroken line.
    pub(crate) fn shape(
        &mut self,
        path: &Path,
        text: &str,
        size_px: f32,
        letter_spacing: f32,
    ) -> RenderResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Ok(ShapedLine::default());
        }
        let family = self
            .faces
            .get(path)
            .map(|f| f.family.clone())
            .ok_or_else(|| RenderError::asset(format!("font '{}' not registered", path.display())))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(letter_spacing));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let baseline = run.baseline();
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - baseline,
                }));
            }
        }

        Ok(ShapedLine {
            width: f64::from(layout.full_width()),
            glyphs,
        })
    }
}
