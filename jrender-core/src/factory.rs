//! Renderer construction and shared configuration.
//!
//! The factory is an ordinary immutable value, not a process-wide static:
//! construct it once at startup, pass it wherever renderers are made, and
//! substitute a fresh instance per test case. Its feature set is fixed at
//! construction time; there are no mutators.

use std::io::Write;

use crate::level::RenderLevel;
use crate::render::{BufferedRenderer, JsonRenderer, StreamRenderer};
use crate::sink::TextSink;

/// Immutable configuration for creating renderers.
///
/// ```
/// use jrender_core::{RendererFactory, RenderLevel};
///
/// let factory = RendererFactory::with_level(RenderLevel::Short);
/// let mut r = factory.buffered();
/// assert_eq!(r.level(), RenderLevel::Short);
/// r.array()?.value(true)?.value("blubb")?.end_array()?;
/// assert_eq!(r.build()?, r#"[true,"blubb"]"#);
/// # Ok::<(), jrender_core::RenderError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererFactory {
    level: RenderLevel,
}

impl RendererFactory {
    /// Factory with the default render level.
    pub fn new() -> Self {
        RendererFactory::default()
    }

    /// Factory whose renderers carry `level`.
    pub fn with_level(level: RenderLevel) -> Self {
        RendererFactory { level }
    }

    /// The level every renderer from this factory carries.
    #[inline]
    pub fn level(&self) -> RenderLevel {
        self.level
    }

    /// Renderer that accumulates text in memory.
    ///
    /// Supports [`build`](BufferedRenderer::build) to materialize the
    /// produced JSON as a `String`.
    pub fn buffered(&self) -> BufferedRenderer {
        JsonRenderer::with_level(TextSink::new(Vec::new()), self.level)
    }

    /// Renderer that writes directly to `out`.
    ///
    /// Output is UTF-8 and is flushed at every top-level boundary. The text
    /// is not observable through the renderer; the destination owns it.
    pub fn streaming<W: Write>(&self, out: W) -> StreamRenderer<W> {
        JsonRenderer::with_level(TextSink::new(out), self.level)
    }
}
