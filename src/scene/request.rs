use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::color::parse_color;
use crate::foundation::core::{Canvas, total_frames};
use crate::foundation::error::{RenderError, RenderResult};
use crate::scene::model::{ElementKind, RenderOptions, Timeline, TimelineElement};

/// One render request: the timeline plus output options, delivered once per session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Elements keyed by id.
    #[serde(default)]
    pub timeline: Timeline,
    /// Output options.
    #[serde(default)]
    pub options: RenderOptions,
}

impl RenderRequest {
    /// Parse a request from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RenderResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| RenderError::serde(format!("parse render request JSON: {e}")))
    }

    /// Parse a request from a JSON string.
    pub fn from_json_str(s: &str) -> RenderResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| RenderError::serde(format!("parse render request JSON: {e}")))
    }

    /// Parse a request from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RenderError::validation(format!("open render request '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.options.preview_size.w,
            height: self.options.preview_size.h,
        }
    }

    /// Number of frames this request produces.
    pub fn total_frames(&self) -> u64 {
        total_frames(self.options.video_duration)
    }

    /// Check the request before any asset is loaded.
    pub fn validate(&self) -> RenderResult<()> {
        let canvas = self.canvas();
        if canvas.width == 0 || canvas.height == 0 {
            return Err(RenderError::validation("previewSize must be non-zero"));
        }
        if canvas.width > u32::from(u16::MAX) || canvas.height > u32::from(u16::MAX) {
            return Err(RenderError::validation(format!(
                "previewSize {}x{} exceeds {} pixels per side",
                canvas.width,
                canvas.height,
                u16::MAX
            )));
        }
        let duration = self.options.video_duration;
        if !duration.is_finite() || duration < 0.0 {
            return Err(RenderError::validation(
                "videoDuration must be finite and >= 0",
            ));
        }
        parse_color(&self.options.background_color)
            .map_err(|e| RenderError::validation(format!("backgroundColor: {e}")))?;

        for (id, el) in &self.timeline {
            validate_element(&self.timeline, id, el)
                .map_err(|e| RenderError::validation(format!("element '{id}': {e}")))?;
        }
        Ok(())
    }
}

fn validate_element(timeline: &Timeline, id: &str, el: &TimelineElement) -> Result<(), String> {
    for (name, v) in [
        ("startTime", el.start_time),
        ("duration", el.duration),
        ("width", el.width),
        ("height", el.height),
        ("rotation", el.rotation),
        ("opacity", el.opacity),
    ] {
        if !v.is_finite() {
            return Err(format!("{name} must be finite"));
        }
    }
    if el.duration < 0.0 {
        return Err("duration must be >= 0".to_owned());
    }
    if el.kind.is_dynamic() && !(el.speed.is_finite() && el.speed > 0.0) {
        return Err("speed must be finite and > 0".to_owned());
    }
    if matches!(
        el.kind,
        ElementKind::Image | ElementKind::Gif | ElementKind::Video(_) | ElementKind::Audio(_)
    ) && el.localpath.as_deref().is_none_or(str::is_empty)
    {
        return Err(format!("{} element requires localpath", el.kind.name()));
    }

    match &el.kind {
        ElementKind::Text(text) => {
            if let Some(parent) = text.parent() {
                if parent == id {
                    return Err("parentKey must not reference itself".to_owned());
                }
                if !timeline.contains_key(parent) {
                    return Err(format!("parentKey '{parent}' does not exist"));
                }
            }
            if !(text.fontsize.is_finite() && text.fontsize > 0.0) {
                return Err("fontsize must be finite and > 0".to_owned());
            }
            parse_color(&text.textcolor).map_err(|e| format!("textcolor: {e}"))?;
            if text.options.outline.enable {
                parse_color(&text.options.outline.color)
                    .map_err(|e| format!("outline color: {e}"))?;
            }
            if text.background.enable {
                parse_color(&text.background.color)
                    .map_err(|e| format!("background color: {e}"))?;
            }
        }
        ElementKind::Shape(shape) => {
            if !shape.shape.is_empty() && !(shape.o_width > 0.0 && el.width > 0.0) {
                return Err("shape requires oWidth > 0 and width > 0".to_owned());
            }
            parse_color(&shape.option.fill_color).map_err(|e| format!("fillColor: {e}"))?;
        }
        ElementKind::Video(video) => {
            if let Some(trim) = video.trim
                && !(trim.start_time.is_finite() && trim.end_time.is_finite())
            {
                return Err("trim must be finite".to_owned());
            }
        }
        ElementKind::Image | ElementKind::Gif | ElementKind::Audio(_) => {}
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/request.rs"]
mod tests;
