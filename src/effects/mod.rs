//! Video filters: parsing, CPU and GPU execution, per-element resource caching.

pub(crate) mod cpu;
pub(crate) mod filter;
#[cfg(feature = "gpu")]
pub(crate) mod gpu;
pub(crate) mod pipeline;
