use std::path::PathBuf;

use crate::config::RenderConfig;
use crate::eval::visibility::trim_or_full;
use crate::scene::model::{ElementKind, Timeline};

/// One audio input of the muxed output.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    /// Element the audio comes from.
    pub element_id: String,
    /// Source file.
    pub path: PathBuf,
    /// Seek into the source, milliseconds.
    pub in_start_ms: f64,
    /// Length read from the source, milliseconds.
    pub in_duration_ms: f64,
    /// Offset on the output timeline, milliseconds.
    pub delay_ms: f64,
}

/// Audio tracks to mix: every audio element and every video element flagged with an audio
/// stream, in ascending element-id order.
///
/// Elements that start before zero have the skipped part cut from the source instead of
/// being delayed.
pub fn collect_audio_tracks(timeline: &Timeline, config: &RenderConfig) -> Vec<AudioTrack> {
    let mut tracks = Vec::new();
    for (id, el) in timeline {
        let trim = match &el.kind {
            ElementKind::Audio(audio) => audio.trim,
            ElementKind::Video(video) if video.is_exist_audio => video.trim,
            _ => continue,
        };
        let Some(path) = el.localpath.as_deref() else {
            tracing::warn!(element = %id, "audio source has no localpath, skipped");
            continue;
        };
        let trim = trim_or_full(trim, el.duration);

        let mut in_start = trim.start_time * el.speed;
        let in_duration = trim.end_time - trim.start_time;
        let mut delay = el.start_time + in_start;
        if el.start_time < 0.0 {
            let d = in_start - el.start_time.abs();
            if d >= 0.0 {
                delay = d;
            } else {
                delay = 0.0;
                in_start = trim.start_time * el.speed + d.abs();
            }
        }

        tracks.push(AudioTrack {
            element_id: id.clone(),
            path: config.resolve_asset_path(path),
            in_start_ms: in_start,
            in_duration_ms: in_duration,
            delay_ms: delay,
        });
    }
    tracks
}
