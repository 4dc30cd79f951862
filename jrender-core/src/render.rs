//! The fluent renderer and its call-order state machine.
//!
//! [`JsonRenderer`] is the one builder implementation, parameterized by the
//! injected [`JsonSink`] capability. Every operation runs the same two
//! steps: gate the call against the nesting state, then forward it to the
//! sink. The gate is the only logic the renderer owns.
//!
//! # Call-order rules
//!
//! - the first call must open a container (or write one complete document
//!   through [`serialized`](JsonRenderer::serialized))
//! - keys and values are only legal while at least one container is open
//! - once the outermost container closes, the render is finished; only
//!   [`close`](JsonRenderer::close) (and, for buffered renderers,
//!   [`build`](BufferedRenderer::build)) remain legal
//! - every close that returns the depth to zero flushes the sink, so output
//!   is visible at each top-level boundary

use std::io::{self, Write};

use log::{debug, trace};

use crate::error::{RenderError, SequenceError};
use crate::level::RenderLevel;
use crate::sink::{JsonSink, TextSink};
use crate::value::Value;

/// Nesting state of a render in progress.
///
/// Depth counts unmatched open containers. A render starts in `NotStarted`;
/// the only way into `Open` is an explicit container open, and once the
/// depth returns to zero the render is `Closed` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum RenderState {
    #[default]
    NotStarted,
    Open(u32),
    Closed,
}

impl RenderState {
    /// Gate for key, value and end operations: a container must be open.
    fn check_running(self) -> Result<(), SequenceError> {
        match self {
            RenderState::Open(_) => Ok(()),
            RenderState::Closed => Err(SequenceError::AfterLast),
            RenderState::NotStarted => Err(SequenceError::BeforeFirst),
        }
    }

    /// Gate for container opens: legal any time before the render finished.
    fn check_not_finished(self) -> Result<(), SequenceError> {
        match self {
            RenderState::Closed => Err(SequenceError::AfterLast),
            _ => Ok(()),
        }
    }
}

/// A producer of object members, driven by the renderer.
///
/// Implementors write `key`/`value` pairs into the current object; they must
/// not open or close the object themselves. Producers that emit
/// level-dependent detail consult [`JsonRenderer::level`].
pub trait RenderPairs {
    /// Write this producer's members into the current object.
    fn render_pairs<S: JsonSink>(&self, renderer: &mut JsonRenderer<S>)
        -> Result<(), RenderError>;
}

/// Fluent streaming JSON builder.
///
/// Operations return `Result<&mut Self, RenderError>` so call chains compose
/// with `?`:
///
/// ```
/// use jrender_core::RendererFactory;
///
/// let mut r = RendererFactory::new().buffered();
/// r.object()?.key("key")?.value("value")?.end_object()?;
/// assert_eq!(r.build()?, r#"{"key":"value"}"#);
/// # Ok::<(), jrender_core::RenderError>(())
/// ```
#[derive(Debug)]
pub struct JsonRenderer<S: JsonSink> {
    sink: S,
    state: RenderState,
    level: RenderLevel,
}

impl<S: JsonSink> JsonRenderer<S> {
    /// Wrap a sink with the default render level.
    pub fn new(sink: S) -> Self {
        JsonRenderer::with_level(sink, RenderLevel::default())
    }

    /// Wrap a sink with an explicit render level.
    pub fn with_level(sink: S, level: RenderLevel) -> Self {
        JsonRenderer {
            sink,
            state: RenderState::NotStarted,
            level,
        }
    }

    /// The verbosity policy carried by this renderer.
    ///
    /// The renderer never interprets it; it exists for
    /// [`RenderPairs`] producers.
    #[inline]
    pub fn level(&self) -> RenderLevel {
        self.level
    }

    /// True once the underlying sink has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    /// Open a JSON array.
    pub fn array(&mut self) -> Result<&mut Self, RenderError> {
        self.state.check_not_finished()?;
        self.sink.begin_array()?;
        self.opened();
        Ok(self)
    }

    /// Close the innermost JSON array.
    ///
    /// Returning the depth to zero finishes the render and flushes the
    /// sink.
    pub fn end_array(&mut self) -> Result<&mut Self, RenderError> {
        self.state.check_running()?;
        self.sink.end_array()?;
        self.closed_one()?;
        Ok(self)
    }

    /// Open a JSON object.
    pub fn object(&mut self) -> Result<&mut Self, RenderError> {
        self.state.check_not_finished()?;
        self.sink.begin_object()?;
        self.opened();
        Ok(self)
    }

    /// Close the innermost JSON object.
    ///
    /// Returning the depth to zero finishes the render and flushes the
    /// sink.
    pub fn end_object(&mut self) -> Result<&mut Self, RenderError> {
        self.state.check_running()?;
        self.sink.end_object()?;
        self.closed_one()?;
        Ok(self)
    }

    /// Write a member name.
    ///
    /// `key(None)` writes the literal four-character name `null`, not a
    /// JSON null.
    pub fn key<'k>(&mut self, key: impl Into<Option<&'k str>>) -> Result<&mut Self, RenderError> {
        self.state.check_running()?;
        self.sink.field_name(key.into().unwrap_or("null"))?;
        Ok(self)
    }

    /// Write a JSON `null`.
    pub fn null_value(&mut self) -> Result<&mut Self, RenderError> {
        self.state.check_running()?;
        self.sink.null_value()?;
        Ok(self)
    }

    /// Write a scalar value.
    ///
    /// Accepts anything convertible to [`Value`]; a `None` string routes to
    /// [`null_value`](JsonRenderer::null_value).
    pub fn value<'v>(&mut self, value: impl Into<Value<'v>>) -> Result<&mut Self, RenderError> {
        self.state.check_running()?;
        match value.into() {
            Value::Null => self.sink.null_value()?,
            Value::Bool(b) => self.sink.bool_value(b)?,
            Value::Integer(i) => self.sink.integer_value(i)?,
            Value::Float(f) => self.sink.float_value(f)?,
            Value::String(s) => self.sink.string_value(s)?,
        }
        Ok(self)
    }

    /// Populate the current object from a pair producer.
    ///
    /// A missing producer is a legal no-op in any state.
    pub fn pairs<P: RenderPairs + ?Sized>(
        &mut self,
        pairs: Option<&P>,
    ) -> Result<&mut Self, RenderError> {
        let Some(pairs) = pairs else { return Ok(self) };
        self.state.check_running()?;
        pairs.render_pairs(self)?;
        Ok(self)
    }

    /// Open an object, populate it from the producer, and close it again.
    ///
    /// A missing producer degenerates to an empty object. The open and the
    /// close count as ordinary depth transitions; the producer's writes are
    /// ordinary key/value calls.
    pub fn object_from<P: RenderPairs + ?Sized>(
        &mut self,
        pairs: Option<&P>,
    ) -> Result<&mut Self, RenderError> {
        self.object()?.pairs(pairs)?.end_object()
    }

    /// Write any serializable value as one complete JSON value.
    ///
    /// Inside a container this behaves like an ordinary value write. At the
    /// top level it emits a free-standing JSON document (scalar or tree),
    /// flushes, and finishes the render.
    pub fn serialized<T: serde::Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<&mut Self, RenderError> {
        self.state.check_not_finished()?;
        self.sink.serialized_value(value)?;
        if self.state == RenderState::NotStarted {
            self.state = RenderState::Closed;
            trace!("free-standing document written, flushing");
            self.sink.flush()?;
        }
        Ok(self)
    }

    /// Flush and close the sink. Safe to call any number of times.
    ///
    /// Closing while containers are still open truncates the document; the
    /// output written so far is flushed as-is and the caller owns the
    /// consequences.
    pub fn close(&mut self) -> Result<(), RenderError> {
        if self.sink.is_closed() {
            return Ok(());
        }
        if let RenderState::Open(depth) = self.state {
            debug!("closing renderer with {depth} containers still open");
        }
        self.state = RenderState::Closed;
        self.sink.flush()?;
        self.sink.close()?;
        Ok(())
    }

    fn opened(&mut self) {
        self.state = match self.state {
            RenderState::Open(depth) => RenderState::Open(depth + 1),
            _ => RenderState::Open(1),
        };
    }

    /// Account for one closed container; flush when the last one closes.
    fn closed_one(&mut self) -> Result<(), RenderError> {
        if let RenderState::Open(depth) = self.state {
            if depth == 1 {
                self.state = RenderState::Closed;
                trace!("top-level container closed, flushing");
                self.sink.flush()?;
            } else {
                self.state = RenderState::Open(depth - 1);
            }
        }
        Ok(())
    }
}

/// Renderer accumulating text in an owned in-memory buffer.
///
/// The only flavor that can materialize its output as a `String`.
pub type BufferedRenderer = JsonRenderer<TextSink<Vec<u8>>>;

/// Renderer writing through to a caller-owned destination.
///
/// There is no way to ask it for the produced text; the destination owns
/// the bytes.
pub type StreamRenderer<W> = JsonRenderer<TextSink<W>>;

impl BufferedRenderer {
    /// Renderer accumulating into a fresh in-memory buffer, default level.
    pub fn buffered() -> Self {
        JsonRenderer::new(TextSink::new(Vec::new()))
    }

    /// Materialize the accumulated JSON text.
    ///
    /// Finishes the render first: the sink is flushed and closed, so calling
    /// this mid-document returns the structurally incomplete output written
    /// so far.
    pub fn build(mut self) -> Result<String, RenderError> {
        self.close()?;
        let bytes = self.sink.into_inner();
        String::from_utf8(bytes)
            .map_err(|e| RenderError::Rendering(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

impl<W: Write> StreamRenderer<W> {
    /// Renderer writing through to `out`, default level.
    pub fn streaming(out: W) -> Self {
        JsonRenderer::new(TextSink::new(out))
    }

    /// Finish the render and hand back the destination writer.
    pub fn into_writer(mut self) -> Result<W, RenderError> {
        self.close()?;
        Ok(self.sink.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records forwarded operations so tests can assert order and counts.
    #[derive(Debug, Default)]
    struct RecordingSink {
        ops: Vec<String>,
        flushes: usize,
        closed: bool,
    }

    impl RecordingSink {
        fn push(&mut self, op: impl Into<String>) -> io::Result<()> {
            self.ops.push(op.into());
            Ok(())
        }
    }

    impl JsonSink for RecordingSink {
        fn begin_array(&mut self) -> io::Result<()> {
            self.push("[")
        }
        fn end_array(&mut self) -> io::Result<()> {
            self.push("]")
        }
        fn begin_object(&mut self) -> io::Result<()> {
            self.push("{")
        }
        fn end_object(&mut self) -> io::Result<()> {
            self.push("}")
        }
        fn field_name(&mut self, name: &str) -> io::Result<()> {
            self.push(format!("key:{name}"))
        }
        fn null_value(&mut self) -> io::Result<()> {
            self.push("null")
        }
        fn bool_value(&mut self, value: bool) -> io::Result<()> {
            self.push(format!("bool:{value}"))
        }
        fn integer_value(&mut self, value: i64) -> io::Result<()> {
            self.push(format!("int:{value}"))
        }
        fn float_value(&mut self, value: f64) -> io::Result<()> {
            self.push(format!("float:{value}"))
        }
        fn string_value(&mut self, value: &str) -> io::Result<()> {
            self.push(format!("str:{value}"))
        }
        fn serialized_value<T: serde::Serialize + ?Sized>(
            &mut self,
            value: &T,
        ) -> io::Result<()> {
            let text = serde_json::to_string(value).map_err(io::Error::from)?;
            self.push(format!("ser:{text}"))
        }
        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
        fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            Ok(())
        }
        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    fn renderer() -> JsonRenderer<RecordingSink> {
        JsonRenderer::new(RecordingSink::default())
    }

    fn is_before_first(err: RenderError) -> bool {
        matches!(err, RenderError::Sequence(SequenceError::BeforeFirst))
    }

    fn is_after_last(err: RenderError) -> bool {
        matches!(err, RenderError::Sequence(SequenceError::AfterLast))
    }

    #[test]
    fn test_value_before_open_fails() {
        let mut r = renderer();
        assert!(is_before_first(r.value("x").unwrap_err()));
        assert!(is_before_first(r.key("x").unwrap_err()));
        assert!(is_before_first(r.null_value().unwrap_err()));
        assert!(is_before_first(r.end_object().unwrap_err()));
        assert!(is_before_first(r.end_array().unwrap_err()));
        // nothing reached the sink
        assert!(r.sink.ops.is_empty());
    }

    #[test]
    fn test_write_after_finish_fails() {
        let mut r = renderer();
        r.object().unwrap();
        r.end_object().unwrap();
        assert!(is_after_last(r.key("x").unwrap_err()));
        assert!(is_after_last(r.value(1).unwrap_err()));
        assert!(is_after_last(r.object().unwrap_err()));
        assert!(is_after_last(r.array().unwrap_err()));
        assert!(is_after_last(r.end_object().unwrap_err()));
        assert!(is_after_last(r.serialized("x").unwrap_err()));
    }

    #[test]
    fn test_depth_tracking() {
        let mut r = renderer();
        r.object().unwrap();
        r.key("inner").unwrap();
        r.object().unwrap();
        r.end_object().unwrap();
        // still open: no flush yet
        assert_eq!(r.sink.flushes, 0);
        r.end_object().unwrap();
        assert_eq!(r.sink.flushes, 1);
    }

    #[test]
    fn test_flush_on_top_level_close_only() {
        let mut r = renderer();
        r.array().unwrap();
        r.array().unwrap();
        r.array().unwrap();
        r.end_array().unwrap();
        r.end_array().unwrap();
        assert_eq!(r.sink.flushes, 0);
        r.end_array().unwrap();
        assert_eq!(r.sink.flushes, 1);
    }

    #[test]
    fn test_fluent_chain_forwards_in_order() {
        let mut r = renderer();
        r.object()
            .and_then(|r| r.key("key"))
            .and_then(|r| r.value("value"))
            .and_then(|r| r.end_object())
            .unwrap();
        assert_eq!(r.sink.ops, vec!["{", "key:key", "str:value", "}"]);
    }

    #[test]
    fn test_null_key_uses_literal_name() {
        let mut r = renderer();
        r.object().unwrap();
        r.key(None).unwrap();
        r.value(1).unwrap();
        r.end_object().unwrap();
        assert_eq!(r.sink.ops[1], "key:null");
    }

    #[test]
    fn test_missing_string_value_is_null() {
        let mut r = renderer();
        r.array().unwrap();
        r.value(None::<&str>).unwrap();
        r.end_array().unwrap();
        assert_eq!(r.sink.ops[1], "null");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut r = renderer();
        r.object().unwrap();
        r.end_object().unwrap();
        r.close().unwrap();
        let flushes = r.sink.flushes;
        r.close().unwrap();
        r.close().unwrap();
        // second and third close touched nothing
        assert_eq!(r.sink.flushes, flushes);
        assert!(r.is_closed());
    }

    #[test]
    fn test_early_close_truncates() {
        let mut r = renderer();
        r.object().unwrap();
        r.key("a").unwrap();
        r.close().unwrap();
        assert!(r.is_closed());
        assert!(is_after_last(r.value(1).unwrap_err()));
        assert!(is_after_last(r.object().unwrap_err()));
    }

    #[test]
    fn test_serialized_at_top_level_finishes() {
        let mut r = renderer();
        r.serialized("x").unwrap();
        assert_eq!(r.sink.ops, vec![r#"ser:"x""#]);
        assert_eq!(r.sink.flushes, 1);
        assert!(is_after_last(r.value(1).unwrap_err()));
        assert!(is_after_last(r.serialized("y").unwrap_err()));
    }

    #[test]
    fn test_serialized_inside_container_is_plain_value() {
        let mut r = renderer();
        r.array().unwrap();
        r.serialized(&7).unwrap();
        assert_eq!(r.sink.flushes, 0);
        r.end_array().unwrap();
        assert_eq!(r.sink.ops, vec!["[", "ser:7", "]"]);
    }

    struct Greeting;

    impl RenderPairs for Greeting {
        fn render_pairs<S: JsonSink>(
            &self,
            renderer: &mut JsonRenderer<S>,
        ) -> Result<(), RenderError> {
            renderer.key("hello")?.value("world")?;
            Ok(())
        }
    }

    #[test]
    fn test_pairs_requires_open_container() {
        let mut r = renderer();
        assert!(is_before_first(r.pairs(Some(&Greeting)).unwrap_err()));
        r.object().unwrap();
        r.pairs(Some(&Greeting)).unwrap();
        r.end_object().unwrap();
        assert_eq!(r.sink.ops, vec!["{", "key:hello", "str:world", "}"]);
    }

    #[test]
    fn test_missing_pairs_is_noop_anywhere() {
        let mut r = renderer();
        // legal even before the first open
        r.pairs(None::<&Greeting>).unwrap();
        r.object().unwrap();
        r.pairs(None::<&Greeting>).unwrap();
        r.end_object().unwrap();
        assert_eq!(r.sink.ops, vec!["{", "}"]);
    }

    #[test]
    fn test_object_from_producer() {
        let mut r = renderer();
        r.object_from(Some(&Greeting)).unwrap();
        assert_eq!(r.sink.ops, vec!["{", "key:hello", "str:world", "}"]);
        // the close counted as the top-level transition
        assert_eq!(r.sink.flushes, 1);
        assert!(is_after_last(r.object().unwrap_err()));
    }

    #[test]
    fn test_object_from_missing_producer_is_empty() {
        let mut r = renderer();
        r.object_from(None::<&Greeting>).unwrap();
        assert_eq!(r.sink.ops, vec!["{", "}"]);
    }

    #[test]
    fn test_level_is_carried() {
        let r = JsonRenderer::with_level(RecordingSink::default(), RenderLevel::Short);
        assert_eq!(r.level(), RenderLevel::Short);
        assert_eq!(renderer().level(), RenderLevel::Complete);
    }

    #[test]
    fn test_value_conversions_reach_sink() {
        let mut r = renderer();
        r.array().unwrap();
        r.value(true).unwrap();
        r.value(7_i64).unwrap();
        r.value(7_i32).unwrap();
        r.value(2.5).unwrap();
        r.value("s").unwrap();
        r.value(Value::Null).unwrap();
        r.end_array().unwrap();
        assert_eq!(
            r.sink.ops,
            vec!["[", "bool:true", "int:7", "int:7", "float:2.5", "str:s", "null", "]"]
        );
    }
}
