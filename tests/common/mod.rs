#![allow(dead_code)]

use std::path::{Path, PathBuf};

use offscreen_render::{EncodedFrame, FilterBackend, FrameFormat, RenderConfig};

pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "offscreen_render_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_solid_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    let data = rgba.repeat((w * h) as usize);
    image::save_buffer_with_format(
        path,
        &data,
        w,
        h,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .unwrap();
}

/// Two-frame GIF, red then green, 100 ms per frame.
pub fn write_red_green_gif(path: &Path) {
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, RgbaImage};

    let file = std::fs::File::create(path).unwrap();
    let mut enc = GifEncoder::new(file);
    for rgba in [[255, 0, 0, 255], [0, 255, 0, 255]] {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
        let frame = Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(100, 1));
        enc.encode_frame(frame).unwrap();
    }
}

/// CPU filters, raw frames, assets resolved against `root`.
pub fn config(root: &Path) -> RenderConfig {
    RenderConfig {
        assets_root: Some(root.to_path_buf()),
        filter_backend: FilterBackend::Cpu,
        frame_format: FrameFormat::Raw,
        ..RenderConfig::default()
    }
}

/// Straight-alpha pixel of a raw frame.
pub fn px(frame: &EncodedFrame, x: u32, y: u32) -> [u8; 4] {
    assert_eq!(frame.format, FrameFormat::Raw);
    let i = ((y * frame.width + x) * 4) as usize;
    frame.bytes[i..i + 4].try_into().unwrap()
}

pub fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 3)
}

/// A font shipped with common Linux distributions, if any is installed.
pub fn system_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .find(|p| p.is_file())
}
