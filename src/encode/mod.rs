//! Output side: sinks, the encoder thread and ffmpeg muxing.

/// Audio tracks muxed alongside the frames.
pub mod audio;
pub(crate) mod emitter;
/// MP4 muxing through the system ffmpeg.
pub mod ffmpeg;
/// The sink trait and built-in sinks.
pub mod sink;
