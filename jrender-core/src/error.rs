//! Error taxonomy for the renderer.
//!
//! Two failure classes exist and they never mix:
//! - [`SequenceError`]: the caller invoked an operation that is illegal in
//!   the current nesting state. Always a programming error; never retried.
//! - [`RenderError::Rendering`]: the underlying sink failed. The renderer
//!   wraps and re-signals it; whether to retry at a higher level (reconnect
//!   a socket, reopen a file) is the caller's decision.

use thiserror::Error;

/// Illegal call order on the builder surface.
///
/// Distinguishes the two ways a call sequence can be out of bounds: before
/// the first container was opened, and after the top-level container was
/// closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A key, value or end method was invoked before any `array()` or
    /// `object()` call.
    #[error("illegal initial call on a key or value method")]
    BeforeFirst,

    /// A write was attempted after the last `end_array()`/`end_object()`
    /// returned the depth to zero, or after `close()`.
    #[error("illegal call after the last end_object() or end_array() call")]
    AfterLast,
}

/// Top-level error type for all renderer operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The call was rejected by the nesting state machine.
    #[error("illegal call sequence: {0}")]
    Sequence(#[from] SequenceError),

    /// The underlying sink failed while writing or flushing.
    #[error("rendering failed: {0}")]
    Rendering(#[from] std::io::Error),
}

impl RenderError {
    /// True if this is a call-order violation rather than a sink failure.
    #[inline]
    pub fn is_sequence(&self) -> bool {
        matches!(self, RenderError::Sequence(_))
    }
}
