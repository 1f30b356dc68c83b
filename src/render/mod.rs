//! Frame serialization.

pub(crate) mod compositor;
pub(crate) mod cpu;
/// Composited frames and their serialization.
pub mod frame;
