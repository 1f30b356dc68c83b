//! Per-pixel evaluation of the filter shaders on straight-alpha float RGBA.

use rayon::prelude::*;

use crate::effects::filter::{FilterKind, RADIAL_SAMPLES};
use crate::foundation::math::smoothstep;

/// Bilinear texture lookup at normalized `(u, v)` with clamp-to-edge addressing.
pub(crate) fn sample_bilinear(src: &[f32], width: u32, height: u32, u: f32, v: f32) -> [f32; 4] {
    let (w, h) = (width as i64, height as i64);
    let x = u * width as f32 - 0.5;
    let y = v * height as f32 - 0.5;
    let (x0f, y0f) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0f, y - y0f);
    let (x0, y0) = (x0f as i64, y0f as i64);

    let texel = |xi: i64, yi: i64| -> [f32; 4] {
        let xi = xi.clamp(0, w - 1) as usize;
        let yi = yi.clamp(0, h - 1) as usize;
        let i = (yi * width as usize + xi) * 4;
        [src[i], src[i + 1], src[i + 2], src[i + 3]]
    };
    let (a, b) = (texel(x0, y0), texel(x0 + 1, y0));
    let (c, d) = (texel(x0, y0 + 1), texel(x0 + 1, y0 + 1));

    let mut out = [0.0; 4];
    for k in 0..4 {
        let top = a[k] + (b[k] - a[k]) * fx;
        let bottom = c[k] + (d[k] - c[k]) * fx;
        out[k] = top + (bottom - top) * fy;
    }
    out
}

fn chroma_key(color: [f32; 4], key: [f32; 3], threshold: f32) -> [f32; 4] {
    let dr = color[0] - key[0];
    let dg = color[1] - key[1];
    let db = color[2] - key[2];
    if (dr * dr + dg * dg + db * db).sqrt() < threshold {
        [0.0; 4]
    } else {
        color
    }
}

fn box_blur(src: &[f32], width: u32, height: u32, u: f32, v: f32, factor: f32) -> [f32; 4] {
    let (tx, ty) = (1.0 / width as f32, 1.0 / height as f32);
    let mut sum = [0.0f32; 4];
    for i in -1..=1 {
        for j in -1..=1 {
            let s = sample_bilinear(
                src,
                width,
                height,
                u + i as f32 * tx * factor,
                v + j as f32 * ty * factor,
            );
            for k in 0..4 {
                sum[k] += s[k];
            }
        }
    }
    sum.map(|c| c / 9.0)
}

fn radial_blur(src: &[f32], width: u32, height: u32, u: f32, v: f32, power: f32) -> [f32; 4] {
    let (cx, cy) = (0.5f32, 0.5f32);
    let (mut x, mut y) = (u, v);
    let len = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
    let rotate_dir = smoothstep(-0.3, 0.3, (len / (0.005 + power * 5.0)).sin()) - 0.5;
    let (shift_x, shift_y) = (cx - x, cy - y);

    let samples = RADIAL_SAMPLES as f32;
    let mut color = [0.0f32; 4];
    for i in 0..RADIAL_SAMPLES {
        let fi = i as f32;
        x += fi / samples * shift_x * 0.01;
        y += fi / samples * shift_y * 0.01;
        let (s, c) = (rotate_dir * power * fi).sin_cos();
        let (dx, dy) = (x - cx, y - cy);
        x = c * dx - s * dy + cx;
        y = s * dx + c * dy + cy;
        let tap = sample_bilinear(src, width, height, x, y);
        for k in 0..4 {
            color[k] += tap[k] / (samples + fi);
        }
    }
    color.map(|ch| ch * 1.5)
}

/// Run one filter from `src` into `dst`, both `width * height * 4` floats.
pub(crate) fn apply_filter(kind: &FilterKind, src: &[f32], dst: &mut [f32], width: u32, height: u32) {
    let row_len = width as usize * 4;
    dst.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, out)| {
            let v = (row as f32 + 0.5) / height as f32;
            for (col, px) in out.chunks_exact_mut(4).enumerate() {
                let u = (col as f32 + 0.5) / width as f32;
                let color = match *kind {
                    FilterKind::ChromaKey { key, threshold } => {
                        let i = (row * width as usize + col) * 4;
                        chroma_key([src[i], src[i + 1], src[i + 2], src[i + 3]], key, threshold)
                    }
                    FilterKind::Blur { factor } => box_blur(src, width, height, u, v, factor),
                    FilterKind::RadialBlur { power } => {
                        radial_blur(src, width, height, u, v, power)
                    }
                };
                for k in 0..4 {
                    px[k] = color[k].clamp(0.0, 1.0);
                }
            }
        });
}

/// Scratch buffers of one filtered element, reused across frames.
#[derive(Debug, Default)]
pub(crate) struct CpuFilterState {
    front: Vec<f32>,
    back: Vec<f32>,
}

impl CpuFilterState {
    /// Run `chain` over straight-alpha RGBA8 `rgba`, returning straight-alpha RGBA8.
    pub(crate) fn run(&mut self, chain: &[FilterKind], rgba: &[u8], width: u32, height: u32) -> Vec<u8> {
        self.front.clear();
        self.front.extend(rgba.iter().map(|&c| f32::from(c) / 255.0));
        self.back.resize(self.front.len(), 0.0);

        for kind in chain {
            apply_filter(kind, &self.front, &mut self.back, width, height);
            std::mem::swap(&mut self.front, &mut self.back);
        }

        self.front
            .iter()
            .map(|&c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/cpu.rs"]
mod tests;
