//! Asset resolution and decoding: images, animated images, video sources and fonts.

pub(crate) mod color;
pub(crate) mod decode;
pub(crate) mod fonts;
pub mod media;
pub(crate) mod store;
