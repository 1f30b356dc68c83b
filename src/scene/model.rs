use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mapping from element id to element. Visual order is governed by `priority`, not map order.
pub type Timeline = BTreeMap<String, TimelineElement>;

/// Keyframes as `[time_ms, value]` pairs in recorded order.
pub type Keyframes = Vec<[f64; 2]>;

/// `parentKey` value marking a text element that does not follow another element.
pub const STANDALONE_PARENT: &str = "standalone";

/// One element of the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineElement {
    /// Paint order, ascending is bottom-to-top.
    #[serde(default)]
    pub priority: i64,
    /// Start time in milliseconds on the output timeline.
    #[serde(default)]
    pub start_time: f64,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: f64,
    /// Top-left corner of the element box.
    #[serde(default)]
    pub location: Location,
    /// Box width in pixels.
    #[serde(default)]
    pub width: f64,
    /// Box height in pixels.
    #[serde(default)]
    pub height: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Opacity in `0..=100`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Playback-rate multiplier (dynamic kinds only).
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Animation curves keyed by property name (`position`, `scale`, `rotation`, `opacity`).
    #[serde(default)]
    pub animation: BTreeMap<String, AnimationCurve>,
    /// Source file of image, gif, video and audio elements.
    #[serde(default)]
    pub localpath: Option<String>,
    /// Kind-specific fields, tagged by `filetype`.
    #[serde(flatten)]
    pub kind: ElementKind,
}

fn default_opacity() -> f64 {
    100.0
}

fn default_speed() -> f64 {
    1.0
}

/// Kind-specific element payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filetype", rename_all = "lowercase")]
pub enum ElementKind {
    /// Still image.
    Image,
    /// Animated GIF.
    Gif,
    /// Video clip.
    Video(VideoProps),
    /// Audio clip. Never drawn, only muxed.
    Audio(AudioProps),
    /// Text block.
    Text(TextProps),
    /// Filled polygon.
    Shape(ShapeProps),
}

impl ElementKind {
    /// Lowercase kind name as it appears in `filetype`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Gif => "gif",
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
            Self::Text(_) => "text",
            Self::Shape(_) => "shape",
        }
    }

    /// Dynamic kinds play back at `speed` and occupy `duration / speed` on the timeline.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Video(_) | Self::Audio(_))
    }

    /// Whether this kind needs a decoded asset before rendering.
    pub fn needs_media(&self) -> bool {
        matches!(self, Self::Image | Self::Gif | Self::Video(_))
    }
}

/// Element position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// X coordinate in canvas pixels.
    #[serde(default)]
    pub x: f64,
    /// Y coordinate in canvas pixels.
    #[serde(default)]
    pub y: f64,
}

/// Keyframe curves for one animated property.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationCurve {
    /// When `false`, the static field value is used unmodified.
    #[serde(default)]
    pub is_activate: bool,
    /// Curve for the x axis or the scalar value.
    #[serde(default)]
    pub ax: Keyframes,
    /// Curve for the y axis.
    #[serde(default)]
    pub ay: Keyframes,
}

/// Visible sub-range of a clip, in milliseconds relative to the element start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trim {
    /// Start of the visible range.
    #[serde(default)]
    pub start_time: f64,
    /// End of the visible range (exclusive).
    #[serde(default)]
    pub end_time: f64,
}

/// Video-specific fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProps {
    /// Trim window. Defaults to the full duration.
    #[serde(default)]
    pub trim: Option<Trim>,
    /// Filter chain.
    #[serde(default)]
    pub filter: FilterSettings,
    /// Whether the source has an audio track to mix into the output.
    #[serde(default)]
    pub is_exist_audio: bool,
}

/// Audio-specific fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioProps {
    /// Trim window. Defaults to the full duration.
    #[serde(default)]
    pub trim: Option<Trim>,
}

/// Video filter configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Master switch for the chain.
    #[serde(default)]
    pub enable: bool,
    /// Filters applied in order.
    #[serde(default)]
    pub list: Vec<FilterEntry>,
}

/// One `{name, value}` filter entry, e.g. `{"name": "blur", "value": "f=3"}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    /// Filter name (`chromakey`, `blur`, `radialblur`).
    pub name: String,
    /// Colon-separated `key=value` parameters.
    #[serde(default)]
    pub value: String,
}

/// Text-specific fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    /// Text content. Words are separated by single spaces.
    #[serde(default)]
    pub text: String,
    /// Font family name, also used to look the font file up in the font directories.
    #[serde(default)]
    pub fontname: String,
    /// Explicit font file.
    #[serde(default)]
    pub fontpath: Option<String>,
    /// Font size in pixels.
    #[serde(default = "default_font_size", deserialize_with = "number_or_string")]
    pub fontsize: f64,
    /// Fill color.
    #[serde(default = "default_text_color")]
    pub textcolor: String,
    /// Extra spacing after every glyph, in pixels.
    #[serde(default, deserialize_with = "number_or_string")]
    pub letter_spacing: f64,
    /// Alignment and decoration.
    #[serde(default)]
    pub options: TextOptions,
    /// Per-line background.
    #[serde(default)]
    pub background: TextBackground,
    /// [`STANDALONE_PARENT`] or the id of the element this text follows.
    #[serde(default = "default_parent_key")]
    pub parent_key: String,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            fontname: String::new(),
            fontpath: None,
            fontsize: default_font_size(),
            textcolor: default_text_color(),
            letter_spacing: 0.0,
            options: TextOptions::default(),
            background: TextBackground::default(),
            parent_key: default_parent_key(),
        }
    }
}

impl TextProps {
    /// The element id this text follows, if any.
    pub fn parent(&self) -> Option<&str> {
        let key = self.parent_key.as_str();
        (!key.is_empty() && key != STANDALONE_PARENT).then_some(key)
    }
}

fn default_font_size() -> f64 {
    16.0
}

fn default_text_color() -> String {
    "#ffffff".to_owned()
}

fn default_parent_key() -> String {
    STANDALONE_PARENT.to_owned()
}

/// Horizontal alignment of wrapped lines inside the box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Text style flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    /// Line alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Bold style.
    #[serde(default)]
    pub is_bold: bool,
    /// Italic style.
    #[serde(default)]
    pub is_italic: bool,
    /// Outline stroke drawn before the fill.
    #[serde(default)]
    pub outline: TextOutline,
}

/// Outline stroke settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextOutline {
    /// Whether to stroke.
    #[serde(default)]
    pub enable: bool,
    /// Stroke width in pixels.
    #[serde(default, deserialize_with = "number_or_string")]
    pub size: f64,
    /// Stroke color.
    #[serde(default = "default_outline_color")]
    pub color: String,
}

impl Default for TextOutline {
    fn default() -> Self {
        Self {
            enable: false,
            size: 0.0,
            color: default_outline_color(),
        }
    }
}

fn default_outline_color() -> String {
    "#000000".to_owned()
}

/// Per-line background rectangle settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextBackground {
    /// Whether to paint backgrounds.
    #[serde(default)]
    pub enable: bool,
    /// Background color.
    #[serde(default = "default_outline_color")]
    pub color: String,
}

impl Default for TextBackground {
    fn default() -> Self {
        Self {
            enable: false,
            color: default_outline_color(),
        }
    }
}

/// Shape-specific fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    /// Polygon points in the original coordinate space.
    #[serde(default)]
    pub shape: Vec<[f64; 2]>,
    /// Width of the original coordinate space.
    #[serde(default)]
    pub o_width: f64,
    /// Fill settings.
    #[serde(default)]
    pub option: ShapeOption,
}

/// Shape fill settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeOption {
    /// Fill color.
    #[serde(default = "default_text_color")]
    pub fill_color: String,
}

impl Default for ShapeOption {
    fn default() -> Self {
        Self {
            fill_color: default_text_color(),
        }
    }
}

/// Output settings of one render request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Output frame size.
    #[serde(default)]
    pub preview_size: PreviewSize,
    /// Color the surface is cleared to before each frame.
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Output duration in seconds.
    #[serde(default)]
    pub video_duration: f64,
    /// Video bitrate in kbit/s.
    #[serde(default = "default_bitrate")]
    pub video_bitrate: u32,
    /// Output file.
    #[serde(default)]
    pub video_destination: Option<PathBuf>,
    /// Output folder, used when no explicit destination file is given.
    #[serde(default)]
    pub video_destination_folder: Option<PathBuf>,
    /// Editor preview scale. Carried through for the host, not used for rendering.
    #[serde(default = "default_preview_ratio")]
    pub preview_ratio: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preview_size: PreviewSize::default(),
            background_color: default_background(),
            video_duration: 0.0,
            video_bitrate: default_bitrate(),
            video_destination: None,
            video_destination_folder: None,
            preview_ratio: default_preview_ratio(),
        }
    }
}

impl RenderOptions {
    /// Output path: `videoDestination`, else `videoDestinationFolder/output.mp4`.
    pub fn destination(&self) -> Option<PathBuf> {
        self.video_destination.clone().or_else(|| {
            self.video_destination_folder
                .as_ref()
                .map(|dir| dir.join("output.mp4"))
        })
    }
}

fn default_background() -> String {
    "#000000".to_owned()
}

fn default_bitrate() -> u32 {
    10_000
}

fn default_preview_ratio() -> f64 {
    1.0
}

/// Output frame size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSize {
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

impl Default for PreviewSize {
    fn default() -> Self {
        Self { w: 1920, h: 1080 }
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Str(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(v) => Ok(v),
        Repr::Str(s) => s
            .trim()
            .trim_end_matches("px")
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got \"{s}\""))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
