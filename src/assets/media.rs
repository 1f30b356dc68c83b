//! Seekable video sources.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{RenderError, RenderResult};

/// Probed properties of a video source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    /// File the frames come from.
    pub source_path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Container duration in seconds, `0` when unknown.
    pub duration_sec: f64,
    /// Average frame rate of the video stream, `0` when unknown.
    pub fps: f64,
    /// Whether the container carries an audio stream.
    pub has_audio: bool,
}

impl VideoInfo {
    /// Cache key and decode time for a seek to `seconds`.
    ///
    /// With a known frame rate the key is the index of the source frame on screen at `seconds`
    /// (the last frame whose timestamp is not after it), and the decode time sits half a frame
    /// before that frame's timestamp so a decoder that returns the first frame at or after the
    /// seek point lands on it. Without one, the key is the time in microseconds. Times are
    /// clamped to `0..=duration_sec` when the duration is known.
    pub(crate) fn frame_slot(&self, seconds: f64) -> (u64, f64) {
        let mut t = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.duration_sec > 0.0 {
            t = t.min(self.duration_sec);
        }
        if self.fps > 0.0 {
            // Slack for times computed as `k / output_fps` landing a hair below a source frame.
            let index = (t * self.fps + 1e-6).floor();
            let at = ((index - 0.5) / self.fps).max(0.0);
            (index as u64, at)
        } else {
            ((t * 1_000_000.0).round() as u64, t)
        }
    }

    /// Slot of the final frame, used when a seek lands past the last decodable timestamp.
    pub(crate) fn last_frame_slot(&self) -> Option<(u64, f64)> {
        if !(self.duration_sec > 0.0) {
            return None;
        }
        let step = if self.fps > 0.0 { 1.0 / self.fps } else { 0.1 };
        Some(self.frame_slot((self.duration_sec - step).max(0.0)))
    }
}

/// One decoded video frame, straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major, tightly packed pixels.
    pub data: Vec<u8>,
}

impl RgbaFrame {
    /// Wrap `data`, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::asset(format!(
                "frame byte length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// A video handle that returns the frame at an exact media time.
pub trait VideoSource: Send {
    /// Probed properties.
    fn info(&self) -> &VideoInfo;

    /// Block until the frame at `seconds` is decoded and return it.
    fn seek_exact(&mut self, seconds: f64) -> RenderResult<Arc<RgbaFrame>>;
}

/// External programs used for probing and decoding.
#[derive(Clone, Debug)]
pub struct FfmpegTools {
    /// `ffmpeg` executable.
    pub ffmpeg: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// [`VideoSource`] backed by the system `ffmpeg`, one process per uncached frame.
///
/// Decoded frames are kept in an LRU keyed by [`VideoInfo::frame_slot`], so output frames that
/// show the same source frame decode it once.
pub struct FfmpegVideoSource {
    info: VideoInfo,
    tools: FfmpegTools,
    frame_cache: HashMap<u64, Arc<RgbaFrame>>,
    lru: VecDeque<u64>,
    capacity: usize,
}

impl FfmpegVideoSource {
    /// Probe `path` and prepare a source positioned at zero.
    pub fn open(path: &Path, tools: FfmpegTools, capacity: usize) -> RenderResult<Self> {
        let info = probe_video(&tools.ffprobe, path)?;
        Ok(Self {
            info,
            tools,
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        })
    }

    fn insert_frame(&mut self, key: u64, frame: Arc<RgbaFrame>) {
        self.frame_cache.insert(key, frame);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.frame_cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

impl VideoSource for FfmpegVideoSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn seek_exact(&mut self, seconds: f64) -> RenderResult<Arc<RgbaFrame>> {
        let (key, at) = self.info.frame_slot(seconds);
        if let Some(frame) = self.frame_cache.get(&key).cloned() {
            self.touch(key);
            return Ok(frame);
        }
        let (ffmpeg, info) = (&self.tools.ffmpeg, &self.info);
        let data = decode_or_last_frame(info, at, |t| decode_video_frame_rgba8(ffmpeg, info, t))?;
        let frame = Arc::new(RgbaFrame::new(self.info.width, self.info.height, data)?);
        self.insert_frame(key, frame.clone());
        Ok(frame)
    }
}

/// Decode at `at`; when the decoder yields nothing (past the last timestamp) retry once at the
/// final frame.
fn decode_or_last_frame<F>(info: &VideoInfo, at: f64, mut decode: F) -> RenderResult<Vec<u8>>
where
    F: FnMut(f64) -> RenderResult<Option<Vec<u8>>>,
{
    if let Some(data) = decode(at)? {
        return Ok(data);
    }
    if let Some((_, last)) = info.last_frame_slot().filter(|&(_, last)| last < at) {
        tracing::debug!(
            path = %info.source_path.display(),
            requested = at,
            last,
            "seek past the last frame, using the final frame"
        );
        if let Some(data) = decode(last)? {
            return Ok(data);
        }
    }
    Err(RenderError::asset(format!(
        "no decodable frame in '{}' at {at:.6}s",
        info.source_path.display()
    )))
}

#[cfg(feature = "media-ffmpeg")]
fn probe_video(ffprobe: &Path, source_path: &Path) -> RenderResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| {
            RenderError::asset(format!("failed to run '{}': {e}", ffprobe.display()))
        })?;
    if !out.status.success() {
        return Err(RenderError::asset(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| RenderError::asset(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            RenderError::asset(format!(
                "no video stream in '{}'",
                source_path.display()
            ))
        })?;
    let (Some(width), Some(height)) = (video_stream.width, video_stream.height) else {
        return Err(RenderError::asset("missing video dimensions from ffprobe"));
    };
    if width == 0 || height == 0 {
        return Err(RenderError::asset("video reports zero dimensions"));
    }
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let fps = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .filter_map(|r| r.as_deref().and_then(parse_frame_rate))
        .next()
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
        fps,
        has_audio,
    })
}

/// ffprobe rate such as `30000/1001` or `25`; `0/0` and other non-positive rates are `None`.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => num.trim().parse::<f64>().ok()? / den.trim().parse::<f64>().ok()?,
        None => s.trim().parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(not(feature = "media-ffmpeg"))]
fn probe_video(_ffprobe: &Path, _source_path: &Path) -> RenderResult<VideoInfo> {
    Err(RenderError::asset(
        "video elements require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn decode_video_frame_rgba8(
    ffmpeg: &Path,
    source: &VideoInfo,
    time_sec: f64,
) -> RenderResult<Option<Vec<u8>>> {
    let out = std::process::Command::new(ffmpeg)
        .args(["-v", "error", "-ss", &format!("{time_sec:.6}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            RenderError::asset(format!("failed to run '{}': {e}", ffmpeg.display()))
        })?;

    if !out.status.success() {
        return Err(RenderError::asset(format!(
            "ffmpeg video decode failed for '{}' at {time_sec:.6}s: {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if out.stdout.is_empty() {
        return Ok(None);
    }
    let expected_len = source.width as usize * source.height as usize * 4;
    if out.stdout.len() < expected_len {
        return Err(RenderError::asset(format!(
            "ffmpeg returned a truncated frame for '{}' at {time_sec:.6}s",
            source.source_path.display()
        )));
    }
    let mut data = out.stdout;
    data.truncate(expected_len);
    Ok(Some(data))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn decode_video_frame_rgba8(
    _ffmpeg: &Path,
    _source: &VideoInfo,
    _time_sec: f64,
) -> RenderResult<Option<Vec<u8>>> {
    Err(RenderError::asset(
        "video elements require the 'media-ffmpeg' feature",
    ))
}
