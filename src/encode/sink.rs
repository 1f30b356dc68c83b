use std::path::{Path, PathBuf};

use crate::config::FrameFormat;
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::EncodedFrame;

/// Stream parameters announced to a sink before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Number of frames that will be pushed.
    pub total_frames: u64,
    /// Serialization of pushed frames.
    pub format: FrameFormat,
}

/// Consumer of completed frames.
///
/// A session calls `begin` once, then `push_frame` for frames `0..total_frames` in order, then
/// exactly one of `end` or `abort`.
pub trait FrameSink: Send {
    /// Prepare for a stream.
    fn begin(&mut self, config: &SinkConfig) -> RenderResult<()>;

    /// Accept one frame; `progress` is in `0..=100`.
    fn push_frame(&mut self, frame: EncodedFrame, progress: f64) -> RenderResult<()>;

    /// All frames were delivered.
    fn end(&mut self) -> RenderResult<()>;

    /// The session failed or was cancelled; discard partial output.
    fn abort(&mut self, error: &RenderError);
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    /// Configuration received by `begin`.
    pub config: Option<SinkConfig>,
    /// Frames in delivery order.
    pub frames: Vec<EncodedFrame>,
    /// Progress reported with each frame.
    pub progress: Vec<f64>,
    /// Number of `end` calls.
    pub completions: u32,
    /// Message of the error passed to `abort`.
    pub aborted: Option<String>,
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, config: &SinkConfig) -> RenderResult<()> {
        self.config = Some(*config);
        Ok(())
    }

    fn push_frame(&mut self, frame: EncodedFrame, progress: f64) -> RenderResult<()> {
        self.frames.push(frame);
        self.progress.push(progress);
        Ok(())
    }

    fn end(&mut self) -> RenderResult<()> {
        self.completions += 1;
        Ok(())
    }

    fn abort(&mut self, error: &RenderError) {
        self.aborted = Some(error.to_string());
    }
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... into a directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Sink writing into `dir`, created on `begin`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

fn write_png(path: &Path, frame: &EncodedFrame) -> RenderResult<()> {
    match frame.format {
        FrameFormat::Png => std::fs::write(path, &frame.bytes)
            .map_err(|e| RenderError::encode(format!("write '{}': {e}", path.display()))),
        FrameFormat::Raw => image::save_buffer_with_format(
            path,
            &frame.bytes,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| RenderError::encode(format!("write '{}': {e}", path.display()))),
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, _config: &SinkConfig) -> RenderResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create frame directory '{}'", self.dir.display())
        })?;
        self.written.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: EncodedFrame, _progress: f64) -> RenderResult<()> {
        let path = self.frame_path(frame.index.0);
        write_png(&path, &frame)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> RenderResult<()> {
        tracing::info!(
            frames = self.written.len(),
            dir = %self.dir.display(),
            "png sequence written"
        );
        Ok(())
    }

    fn abort(&mut self, error: &RenderError) {
        tracing::warn!(
            frames = self.written.len(),
            error = %error,
            "png sequence aborted, partial frames left in place"
        );
    }
}
