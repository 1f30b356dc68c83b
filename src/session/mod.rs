//! Session lifecycle and cancellation.

/// Cooperative cancellation.
pub mod cancel;
/// The render session state machine.
pub mod render_session;
