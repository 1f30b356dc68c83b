//! Renderer configuration: defaults, an optional JSON file, then environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RenderError, RenderResult};

/// Environment variable overriding [`RenderConfig::assets_root`].
pub const ENV_ASSETS_ROOT: &str = "OFFSCREEN_RENDER_ASSETS_ROOT";
/// Environment variable overriding [`RenderConfig::font_dirs`] (platform path-list separated).
pub const ENV_FONT_DIRS: &str = "OFFSCREEN_RENDER_FONT_DIRS";
/// Environment variable overriding [`RenderConfig::default_font`].
pub const ENV_DEFAULT_FONT: &str = "OFFSCREEN_RENDER_DEFAULT_FONT";
/// Environment variable overriding [`RenderConfig::filter_backend`].
pub const ENV_FILTER_BACKEND: &str = "OFFSCREEN_RENDER_FILTER_BACKEND";
/// Environment variable overriding [`RenderConfig::video_cache_capacity`].
pub const ENV_VIDEO_CACHE_CAPACITY: &str = "OFFSCREEN_RENDER_VIDEO_CACHE_CAPACITY";
/// Environment variable overriding [`LoggingConfig::level`].
pub const ENV_LOG_LEVEL: &str = "OFFSCREEN_RENDER_LOG_LEVEL";

/// Where video filters execute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterBackend {
    /// GPU when available, CPU otherwise.
    #[default]
    Auto,
    /// GPU only. Elements whose GPU resources fail draw unfiltered.
    Gpu,
    /// CPU evaluation of the filter shaders.
    Cpu,
}

impl std::str::FromStr for FilterBackend {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(RenderError::validation(format!(
                "unknown filter backend \"{other}\" (expected auto, gpu or cpu)"
            ))),
        }
    }
}

/// Serialization of emitted frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// PNG, straight alpha.
    #[default]
    Png,
    /// Unpremultiplied RGBA8, row-major.
    Raw,
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `offscreen_render=debug,warn`.
    pub level: String,
    /// Emit JSON lines instead of plain text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Renderer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base directory for relative `localpath` and `fontpath` values.
    pub assets_root: Option<PathBuf>,
    /// Directories searched for `<fontname>.ttf` / `<fontname>.otf`.
    pub font_dirs: Vec<PathBuf>,
    /// Font used when a text element's font cannot be found.
    pub default_font: Option<PathBuf>,
    /// Filter execution backend.
    pub filter_backend: FilterBackend,
    /// Frames buffered between the compositor and the sink thread.
    pub channel_capacity: usize,
    /// Frame serialization.
    pub frame_format: FrameFormat,
    /// Decoded frames kept per video source.
    pub video_cache_capacity: usize,
    /// `ffmpeg` executable.
    pub ffmpeg_path: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe_path: PathBuf,
    /// Logging.
    pub logging: LoggingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            assets_root: None,
            font_dirs: Vec::new(),
            default_font: None,
            filter_backend: FilterBackend::Auto,
            channel_capacity: 4,
            frame_format: FrameFormat::Png,
            video_cache_capacity: 64,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            logging: LoggingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            RenderError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&s)
            .map_err(|e| RenderError::serde(format!("parse config '{}': {e}", path.display())))
    }

    /// Defaults, then `path` when given, then the process environment.
    pub fn load(path: Option<&Path>) -> RenderResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        cfg.apply_env_from(|key| std::env::var_os(key))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `OFFSCREEN_RENDER_*` overrides read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> RenderResult<()>
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        if let Some(v) = lookup(ENV_ASSETS_ROOT) {
            self.assets_root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_FONT_DIRS) {
            self.font_dirs = std::env::split_paths(&v).collect();
        }
        if let Some(v) = lookup(ENV_DEFAULT_FONT) {
            self.default_font = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_FILTER_BACKEND) {
            self.filter_backend = v.to_string_lossy().parse()?;
        }
        if let Some(v) = lookup(ENV_VIDEO_CACHE_CAPACITY) {
            let s = v.to_string_lossy();
            self.video_cache_capacity = s.trim().parse().map_err(|_| {
                RenderError::validation(format!("{ENV_VIDEO_CACHE_CAPACITY}: not a count: \"{s}\""))
            })?;
        }
        if let Some(v) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = v.to_string_lossy().into_owned();
        }
        Ok(())
    }

    /// Reject values the renderer cannot run with.
    pub fn validate(&self) -> RenderResult<()> {
        if self.channel_capacity == 0 {
            return Err(RenderError::validation("channel_capacity must be > 0"));
        }
        if self.video_cache_capacity == 0 {
            return Err(RenderError::validation("video_cache_capacity must be > 0"));
        }
        Ok(())
    }

    /// Resolve `path` against [`RenderConfig::assets_root`] when it is relative.
    pub fn resolve_asset_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        match &self.assets_root {
            Some(root) if p.is_relative() => root.join(p),
            _ => p.to_path_buf(),
        }
    }
}
