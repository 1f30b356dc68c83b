use std::io::Cursor;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use proptest::prelude::*;

use super::*;

fn png_bytes(img: RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn gif_bytes(colors: &[[u8; 4]], delay_ms: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = GifEncoder::new(&mut buf);
        enc.set_repeat(Repeat::Infinite).unwrap();
        let frames = colors.iter().map(|c| {
            Frame::from_parts(
                RgbaImage::from_pixel(4, 2, image::Rgba(*c)),
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            )
        });
        enc.encode_frames(frames).unwrap();
    }
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let img = RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let decoded = decode_image(&png_bytes(img)).unwrap();
    assert_eq!((decoded.width, decoded.height), (1, 1));
    assert_eq!(
        decoded.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_image_rejects_garbage() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn decode_gif_keeps_every_frame_and_delay() {
    let bytes = gif_bytes(&[[255, 0, 0, 255], [0, 0, 255, 255], [0, 255, 0, 255]], 50);
    let gif = decode_gif(&bytes).unwrap();
    assert_eq!((gif.width, gif.height), (4, 2));
    assert_eq!(gif.frames.len(), 3);
    assert_eq!(gif.delays_ms, vec![50, 50, 50]);
    assert_eq!(gif.frame_delay_ms(), 50);
    assert!(gif.frames.iter().all(|f| f.len() == 4 * 2 * 4));
    assert!(gif.frames[0][0] > 200 && gif.frames[0][2] < 50, "frame 0 is red");
    assert!(gif.frames[1][2] > 200 && gif.frames[1][0] < 50, "frame 1 is blue");
}

#[test]
fn zero_delay_reads_as_default() {
    let gif = decode_gif(&gif_bytes(&[[1, 2, 3, 255], [4, 5, 6, 255]], 0)).unwrap();
    assert_eq!(gif.frame_delay_ms(), DEFAULT_GIF_DELAY_MS);
}

#[test]
fn gif_index_examples() {
    assert_eq!(gif_frame_index(0.0, 100, 3), 0);
    assert_eq!(gif_frame_index(99.9, 100, 3), 0);
    assert_eq!(gif_frame_index(100.0, 100, 3), 1);
    assert_eq!(gif_frame_index(300.0, 100, 3), 0);
    assert_eq!(gif_frame_index(-50.0, 100, 3), 0);
    assert_eq!(gif_frame_index(500.0, 100, 0), 0);
}

proptest! {
    #[test]
    fn gif_index_is_floor_mod(t in 0u32..1_000_000, delay in 1u32..1_000, count in 1usize..64) {
        let expected = ((t / delay) as usize) % count;
        prop_assert_eq!(gif_frame_index(f64::from(t), delay, count), expected);
    }
}
