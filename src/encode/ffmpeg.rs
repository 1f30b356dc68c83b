//! MP4 output through the system `ffmpeg` binary.
//!
//! Frames are piped as PNG images (`image2pipe`); audio is assembled from the timeline's audio
//! tracks inside a single `-filter_complex` graph.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::config::{FrameFormat, RenderConfig};
use crate::encode::audio::{AudioTrack, collect_audio_tracks};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::OUTPUT_FPS;
use crate::foundation::error::{RenderError, RenderResult};
use crate::render::frame::EncodedFrame;
use crate::scene::request::RenderRequest;

/// Everything `ffmpeg` needs besides the frames themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct MuxSettings {
    /// Output file.
    pub destination: PathBuf,
    /// Output duration in seconds.
    pub duration_secs: f64,
    /// Video bitrate in kbit/s.
    pub bitrate_kbps: u32,
    /// Audio inputs, mixed into one stream.
    pub tracks: Vec<AudioTrack>,
}

impl MuxSettings {
    /// Settings for `request`; fails when the request names no destination.
    pub fn from_request(request: &RenderRequest, config: &RenderConfig) -> RenderResult<Self> {
        let destination = request.options.destination().ok_or_else(|| {
            RenderError::validation("videoDestination or videoDestinationFolder is required")
        })?;
        Ok(Self {
            destination,
            duration_secs: request.options.video_duration,
            bitrate_kbps: request.options.video_bitrate,
            tracks: collect_audio_tracks(&request.timeline, config),
        })
    }
}

/// `-filter_complex` graph for `tracks`. Input 0 is the frame pipe, audio inputs start at 1.
pub fn build_filter_graph(tracks: &[AudioTrack], duration_secs: f64) -> String {
    let mut parts = Vec::with_capacity(tracks.len() + 3);
    let mut labels = Vec::with_capacity(tracks.len().max(1));
    for (k, track) in tracks.iter().enumerate() {
        let delay = track.delay_ms.round() as i64;
        parts.push(format!("[{}:a]adelay={delay}|{delay}[audio{k}]", k + 1));
        labels.push(format!("[audio{k}]"));
    }
    if tracks.is_empty() {
        parts.push(format!(
            "anullsrc=channel_layout=stereo:sample_rate=44100:d={duration_secs}[silent]"
        ));
        labels.push("[silent]".to_owned());
    }
    parts.push("[0:v]null[vout]".to_owned());
    if labels.len() > 1 {
        parts.push(format!("{}amix=inputs={}[aout]", labels.concat(), labels.len()));
    } else {
        parts.push(format!("{}aresample=async=1[aout]", labels.concat()));
    }
    parts.join(";")
}

/// Full `ffmpeg` argument list for a PNG stream on stdin.
pub fn build_ffmpeg_args(settings: &MuxSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "image2pipe",
        "-vcodec",
        "png",
        "-r",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(OUTPUT_FPS.to_string().into());
    args.extend(["-i", "pipe:0"].map(OsString::from));

    for track in &settings.tracks {
        args.push("-ss".into());
        args.push((track.in_start_ms / 1000.0).to_string().into());
        args.push("-t".into());
        args.push((track.in_duration_ms / 1000.0).to_string().into());
        args.push("-i".into());
        args.push(track.path.clone().into_os_string());
    }

    args.push("-filter_complex".into());
    args.push(build_filter_graph(&settings.tracks, settings.duration_secs).into());
    args.extend(
        [
            "-map", "[vout]", "-map", "[aout]", "-c:a", "aac", "-c:v", "libx264", "-t",
        ]
        .map(OsString::from),
    );
    args.push(settings.duration_secs.to_string().into());
    args.push("-b:v".into());
    args.push(format!("{}k", settings.bitrate_kbps).into());
    args.extend(["-pix_fmt", "yuv420p"].map(OsString::from));
    args.push(settings.destination.clone().into_os_string());
    args
}

/// Whether `program -version` runs successfully.
pub fn is_ffmpeg_on_path(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> RenderResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams frames into an `ffmpeg` child process.
pub struct FfmpegSink {
    program: PathBuf,
    settings: MuxSettings,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    /// Sink running `program` (usually `"ffmpeg"`) with `settings`.
    pub fn new(program: impl Into<PathBuf>, settings: MuxSettings) -> Self {
        Self {
            program: program.into(),
            settings,
            child: None,
            stdin: None,
        }
    }

    /// Sink for `request` using the configured `ffmpeg` binary.
    pub fn from_request(request: &RenderRequest, config: &RenderConfig) -> RenderResult<Self> {
        Ok(Self::new(
            config.ffmpeg_path.clone(),
            MuxSettings::from_request(request, config)?,
        ))
    }

    /// Mux settings in use.
    pub fn settings(&self) -> &MuxSettings {
        &self.settings
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, config: &SinkConfig) -> RenderResult<()> {
        if config.format != FrameFormat::Png {
            return Err(RenderError::validation(
                "the ffmpeg sink needs PNG frames (frame_format = \"png\")",
            ));
        }
        if !config.width.is_multiple_of(2) || !config.height.is_multiple_of(2) {
            return Err(RenderError::validation(format!(
                "output size {}x{} must be even for yuv420p",
                config.width, config.height
            )));
        }
        ensure_parent_dir(&self.settings.destination)?;
        if !is_ffmpeg_on_path(&self.program) {
            return Err(RenderError::encode(format!(
                "'{}' is required for MP4 output, but could not be run",
                self.program.display()
            )));
        }

        let args = build_ffmpeg_args(&self.settings);
        tracing::debug!(program = %self.program.display(), ?args, "spawning ffmpeg");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::encode(format!("failed to spawn ffmpeg: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::encode("failed to open ffmpeg stdin"))?;
        self.stdin = Some(stdin);
        self.child = Some(child);
        Ok(())
    }

    fn push_frame(&mut self, frame: EncodedFrame, _progress: f64) -> RenderResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RenderError::encode("ffmpeg sink is not running"));
        };
        use std::io::Write as _;
        stdin.write_all(&frame.bytes).map_err(|e| {
            RenderError::encode(format!("failed to write frame {} to ffmpeg: {e}", frame.index.0))
        })
    }

    fn end(&mut self) -> RenderResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Err(RenderError::encode("ffmpeg sink is not running"));
        };
        let output = child
            .wait_with_output()
            .map_err(|e| RenderError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        tracing::info!(output = %self.settings.destination.display(), "video written");
        Ok(())
    }

    fn abort(&mut self, error: &RenderError) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let dest = &self.settings.destination;
        if dest.exists()
            && let Err(e) = std::fs::remove_file(dest)
        {
            tracing::warn!(output = %dest.display(), error = %e, "could not remove partial output");
        }
        tracing::warn!(error = %error, "ffmpeg output aborted");
    }
}
