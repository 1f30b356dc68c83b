//! Text measurement, greedy word wrap and drawing.

pub(crate) mod draw;
pub(crate) mod engine;
pub(crate) mod layout;
