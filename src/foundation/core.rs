pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output frame rate. Every render request is sampled at this rate regardless of its duration.
pub const OUTPUT_FPS: u32 = 60;

/// Absolute 0-based output frame index.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Timeline time of this frame in milliseconds: `frame / fps * 1000`.
    pub fn time_ms(self) -> f64 {
        (self.0 as f64 / f64::from(OUTPUT_FPS)) * 1000.0
    }
}

/// Total number of output frames for a duration in seconds (`fps * seconds`, floored).
///
/// Non-finite and negative durations yield zero frames.
pub fn total_frames(video_duration_secs: f64) -> u64 {
    if !video_duration_secs.is_finite() || video_duration_secs <= 0.0 {
        return 0;
    }
    (f64::from(OUTPUT_FPS) * video_duration_secs).floor() as u64
}

/// Progress percentage reported alongside `frame` out of `total` frames.
///
/// Counts the frame being emitted, so the last frame reports exactly `100.0`.
pub fn progress_percent(frame: FrameIndex, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    ((frame.0 + 1).min(total) as f64 / total as f64) * 100.0
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of bytes in one RGBA8 frame of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Premultiplied `[r, g, b, a]` bytes.
    pub fn to_premul_array(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| crate::foundation::math::mul_div255_u8(u16::from(c), a);
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    /// Convert to the `vello_cpu` paint color.
    pub(crate) fn to_cpu_color(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}
