use std::io::Cursor;

use crate::config::FrameFormat;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{RenderError, RenderResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Composited frame, premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` premultiplied bytes.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Straight-alpha pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(self.data.get(i..i + 4)?);
        unpremultiply_rgba8_in_place(&mut px);
        Some(px)
    }
}

/// A serialized frame as handed to a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Output frame index.
    pub index: FrameIndex,
    /// Serialization of `bytes`.
    pub format: FrameFormat,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// PNG file bytes or raw straight-alpha RGBA8.
    pub bytes: Vec<u8>,
}

/// Serialize a composited frame.
pub fn encode_frame(
    index: FrameIndex,
    frame: &FrameRGBA,
    format: FrameFormat,
) -> RenderResult<EncodedFrame> {
    let straight = frame.to_straight_rgba8();
    let bytes = match format {
        FrameFormat::Raw => straight,
        FrameFormat::Png => {
            let mut out = Cursor::new(Vec::new());
            image::write_buffer_with_format(
                &mut out,
                &straight,
                frame.width,
                frame.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .map_err(|e| RenderError::encode(format!("png encode frame {}: {e}", index.0)))?;
            out.into_inner()
        }
    };
    Ok(EncodedFrame {
        index,
        format,
        width: frame.width,
        height: frame.height,
        bytes,
    })
}
