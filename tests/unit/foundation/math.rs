use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn premultiply_then_unpremultiply_is_close_for_opaque_and_half() {
    let mut px = vec![200u8, 100, 50, 255, 200, 100, 50, 128, 9, 9, 9, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[200, 100, 50, 255]);
    assert_eq!(&px[4..8], &[100, 50, 25, 128]);
    assert_eq!(&px[8..12], &[0, 0, 0, 0]);

    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[200, 100, 50, 255]);
    for (got, want) in px[4..7].iter().zip([200u8, 100, 50]) {
        assert!((i16::from(*got) - i16::from(want)).abs() <= 2);
    }
    assert_eq!(&px[8..12], &[0, 0, 0, 0]);
}

#[test]
fn smoothstep_matches_glsl_edges() {
    assert_eq!(smoothstep(-0.3, 0.3, -1.0), 0.0);
    assert_eq!(smoothstep(-0.3, 0.3, 1.0), 1.0);
    assert!((smoothstep(-0.3, 0.3, 0.0) - 0.5).abs() < 1e-6);
}
