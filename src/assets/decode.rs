use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use image::AnimationDecoder;

use crate::foundation::error::{RenderError, RenderResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Delay assumed for animated-image frames that declare none.
pub(crate) const DEFAULT_GIF_DELAY_MS: u32 = 100;

/// Decoded still image.
#[derive(Clone, Debug)]
pub(crate) struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub(crate) rgba8_premul: Arc<Vec<u8>>,
}

/// Fully decompressed animated image.
#[derive(Clone, Debug)]
pub(crate) struct DecodedGif {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Full-canvas frames, premultiplied RGBA8.
    pub(crate) frames: Vec<Arc<Vec<u8>>>,
    /// Per-frame delays in milliseconds, as declared.
    pub(crate) delays_ms: Vec<u32>,
}

impl DecodedGif {
    /// Delay used for frame indexing: frame 0's, with 0 read as [`DEFAULT_GIF_DELAY_MS`].
    pub(crate) fn frame_delay_ms(&self) -> u32 {
        match self.delays_ms.first().copied() {
            Some(0) | None => DEFAULT_GIF_DELAY_MS,
            Some(d) => d,
        }
    }
}

/// Frame shown at output time `t_ms`: `floor(t / delay) mod frame_count`.
pub(crate) fn gif_frame_index(t_ms: f64, delay_ms: u32, frame_count: usize) -> usize {
    if frame_count == 0 || delay_ms == 0 || !t_ms.is_finite() || t_ms <= 0.0 {
        return 0;
    }
    let step = (t_ms / f64::from(delay_ms)).floor() as u64;
    (step % frame_count as u64) as usize
}

pub(crate) fn decode_image(bytes: &[u8]) -> RenderResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn decode_gif(bytes: &[u8]) -> RenderResult<DecodedGif> {
    let decoder =
        image::codecs::gif::GifDecoder::new(Cursor::new(bytes)).context("open gif decoder")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("decode gif frames")?;
    let Some(first) = frames.first() else {
        return Err(RenderError::asset("gif has no frames"));
    };
    let (width, height) = first.buffer().dimensions();

    let mut delays_ms = Vec::with_capacity(frames.len());
    let mut out = Vec::with_capacity(frames.len());
    for frame in frames {
        let (num, den) = frame.delay().numer_denom_ms();
        delays_ms.push(if den == 0 { 0 } else { num / den });
        let mut rgba = frame.into_buffer().into_raw();
        premultiply_rgba8_in_place(&mut rgba);
        out.push(Arc::new(rgba));
    }

    Ok(DecodedGif {
        width,
        height,
        frames: out,
        delays_ms,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
