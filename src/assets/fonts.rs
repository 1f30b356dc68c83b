use std::path::PathBuf;

use crate::config::RenderConfig;
use crate::scene::model::TextProps;

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Locate the font file for a text element.
///
/// Order: `fontpath`, then `<fontname>.ttf|.otf` in each configured font directory, then the
/// configured default font. Returns `None` when none of them exists.
pub(crate) fn resolve_font_path(props: &TextProps, config: &RenderConfig) -> Option<PathBuf> {
    if let Some(path) = props.fontpath.as_deref().filter(|p| !p.is_empty()) {
        let path = config.resolve_asset_path(path);
        if path.is_file() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "fontpath not found");
    }

    let name = props.fontname.trim();
    if !name.is_empty() {
        for dir in &config.font_dirs {
            for ext in FONT_EXTENSIONS {
                let candidate = dir.join(format!("{name}.{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }

    let fallback = config.default_font.as_ref().filter(|p| p.is_file())?;
    tracing::warn!(
        fontname = name,
        fallback = %fallback.display(),
        "font not found, using default font"
    );
    Some(fallback.clone())
}
