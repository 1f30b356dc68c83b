//! Render request boundary model.
//!
//! These types mirror the host application's timeline JSON document. They are parsed once per
//! render request and validated before any asset is loaded.

/// Timeline element and option definitions.
pub mod model;
/// Request parsing and validation.
pub mod request;
