//! Offscreen timeline compositor.
//!
//! A render request (a timeline of image, gif, video, text, shape and audio elements plus output
//! options) is composited frame by frame at a fixed 60 fps and streamed into a [`FrameSink`]:
//!
//! - Parse and validate a [`RenderRequest`]
//! - Create a [`RenderSession`] (assets load once, before the first frame)
//! - Render single frames, or [`RenderSession::run`] the whole timeline into a sink such as
//!   [`FfmpegSink`], [`PngSequenceSink`] or [`InMemorySink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod effects;
mod eval;
mod foundation;
mod text;

/// Runtime configuration: asset roots, fonts, filter backend, channel sizes.
pub mod config;
/// Frame sinks, the encoder thread and ffmpeg muxing.
pub mod encode;
/// Tracing subscriber setup.
pub mod logging;
/// Composited and serialized frames.
pub mod render;
/// Render request boundary model.
pub mod scene;
/// Session-oriented rendering API.
pub mod session;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, FrameIndex, OUTPUT_FPS, Point, Rect, Rgba8, Vec2, progress_percent,
    total_frames,
};
pub use crate::foundation::error::{RenderError, RenderResult};

pub use crate::assets::media::{FfmpegTools, FfmpegVideoSource, RgbaFrame, VideoInfo, VideoSource};
pub use crate::config::{FilterBackend, FrameFormat, LoggingConfig, RenderConfig};
pub use crate::encode::audio::{AudioTrack, collect_audio_tracks};
pub use crate::encode::ffmpeg::{FfmpegSink, MuxSettings, build_ffmpeg_args, build_filter_graph};
pub use crate::encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use crate::render::frame::{EncodedFrame, FrameRGBA, encode_frame};
pub use crate::scene::model::{ElementKind, RenderOptions, Timeline, TimelineElement};
pub use crate::scene::request::RenderRequest;
pub use crate::session::cancel::CancelToken;
pub use crate::session::render_session::{RenderSession, SessionState};
