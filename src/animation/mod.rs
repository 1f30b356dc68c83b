//! Keyframe sampling and per-frame transform resolution.

pub(crate) mod keyframe;
