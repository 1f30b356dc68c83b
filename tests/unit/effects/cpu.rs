use super::*;

fn solid(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    px.iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect()
}

#[test]
fn bilinear_hits_texel_centers_and_clamps() {
    let src = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
    assert_eq!(sample_bilinear(&src, 2, 1, 0.25, 0.5), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(sample_bilinear(&src, 2, 1, 0.75, 0.5), [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(sample_bilinear(&src, 2, 1, 0.5, 0.5), [0.5, 0.5, 0.5, 1.0]);
    assert_eq!(sample_bilinear(&src, 2, 1, -3.0, 9.0), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(sample_bilinear(&src, 2, 1, 4.0, -1.0), [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn chroma_key_clears_only_near_key() {
    let mut rgba = solid(2, 1, [0, 255, 0, 255]);
    rgba[0..4].copy_from_slice(&[255, 0, 0, 255]);
    let chain = [FilterKind::ChromaKey {
        key: [0.0, 1.0, 0.0],
        threshold: 0.5,
    }];
    let out = CpuFilterState::default().run(&chain, &rgba, 2, 1);
    assert_eq!(&out[0..4], &[255, 0, 0, 255]);
    assert_eq!(&out[4..8], &[0, 0, 0, 0]);
}

#[test]
fn blur_keeps_uniform_frames_and_zero_factor_is_identity() {
    let rgba = solid(5, 4, [40, 80, 120, 255]);
    let mut state = CpuFilterState::default();
    assert_eq!(state.run(&[FilterKind::Blur { factor: 3.0 }], &rgba, 5, 4), rgba);

    let mut pattern = rgba.clone();
    pattern[0] = 255;
    pattern[30] = 0;
    assert_eq!(state.run(&[FilterKind::Blur { factor: 0.0 }], &pattern, 5, 4), pattern);
}

#[test]
fn blur_spreads_a_single_bright_pixel() {
    let mut rgba = solid(3, 3, [0, 0, 0, 255]);
    rgba[4 * 4] = 255;
    let out = CpuFilterState::default().run(&[FilterKind::Blur { factor: 1.0 }], &rgba, 3, 3);
    for px in out.chunks_exact(4) {
        assert_eq!(px[0], (255.0f32 / 9.0).round() as u8);
    }
}

#[test]
fn radial_blur_on_uniform_frame_scales_by_weights() {
    let rgba = solid(4, 4, [100, 100, 100, 255]);
    let out = CpuFilterState::default().run(&[FilterKind::RadialBlur { power: 1.0 }], &rgba, 4, 4);
    let weight: f32 = (0..RADIAL_SAMPLES)
        .map(|i| 1.0 / (RADIAL_SAMPLES + i) as f32)
        .sum::<f32>()
        * 1.5;
    let expected = ((100.0 / 255.0 * weight).clamp(0.0, 1.0) * 255.0).round() as u8;
    for px in out.chunks_exact(4) {
        assert!(px[0].abs_diff(expected) <= 1, "{} vs {expected}", px[0]);
        assert_eq!(px[3], 255);
    }
}

#[test]
fn chain_runs_in_order() {
    let rgba = solid(2, 2, [0, 255, 0, 255]);
    let key = FilterKind::ChromaKey {
        key: [0.0, 1.0, 0.0],
        threshold: 0.5,
    };
    let blur = FilterKind::Blur { factor: 1.0 };
    let out = CpuFilterState::default().run(&[key, blur], &rgba, 2, 2);
    assert!(out.iter().all(|&c| c == 0));
}
