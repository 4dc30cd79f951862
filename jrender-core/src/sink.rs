//! Token sink - the delegated writer seam.
//!
//! The renderer never formats a single JSON byte itself. Every token goes
//! through a [`JsonSink`], and the concrete implementation, [`TextSink`],
//! hands the actual encoding to serde_json: structural tokens come from
//! [`CompactFormatter`], scalars and member names from the serde_json
//! serializer (escaping, itoa/ryu number formatting, non-finite floats as
//! `null`).
//!
//! The sink keeps the small container-context stack the `Formatter` protocol
//! requires: which container is open, whether it already has members, and -
//! for objects - whether a member name has been written so a value is
//! pending. Misuse the wrapped encoder cannot express (a member name inside
//! an array, a value with no preceding name, a second top-level value) is
//! reported as an `io::Error`, the same channel real write failures use.

use std::io::{self, Write};

use serde_json::ser::{CompactFormatter, Formatter};

/// Primitive write operations of a streaming JSON writer.
///
/// This is the capability the renderer is parameterized over. It mirrors
/// the generator surface of the wrapped encoder one-to-one; implementations
/// do the encoding, the renderer does the call-order policing.
pub trait JsonSink {
    /// Start a JSON array (`[`).
    fn begin_array(&mut self) -> io::Result<()>;

    /// End the innermost JSON array (`]`).
    fn end_array(&mut self) -> io::Result<()>;

    /// Start a JSON object (`{`).
    fn begin_object(&mut self) -> io::Result<()>;

    /// End the innermost JSON object (`}`).
    fn end_object(&mut self) -> io::Result<()>;

    /// Write a member name inside the current object.
    fn field_name(&mut self, name: &str) -> io::Result<()>;

    /// Write a `null` value.
    fn null_value(&mut self) -> io::Result<()>;

    /// Write a boolean value.
    fn bool_value(&mut self, value: bool) -> io::Result<()>;

    /// Write an integer value.
    fn integer_value(&mut self, value: i64) -> io::Result<()>;

    /// Write a floating point value. Non-finite values encode as `null`.
    fn float_value(&mut self, value: f64) -> io::Result<()>;

    /// Write a string value.
    fn string_value(&mut self, value: &str) -> io::Result<()>;

    /// Write any serializable value as one complete JSON value.
    fn serialized_value<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()>;

    /// Flush buffered output through to the destination.
    fn flush(&mut self) -> io::Result<()>;

    /// Flush and close; further writes fail. Must be idempotent.
    fn close(&mut self) -> io::Result<()>;

    /// True once [`close`](JsonSink::close) has run.
    fn is_closed(&self) -> bool;
}

/// One open container on the sink's context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// `has_members` flips after the first element.
    Array { has_members: bool },
    /// `pending_value` is set between a member name and its value.
    Object { has_members: bool, pending_value: bool },
}

/// Streaming sink writing serde_json-encoded tokens into any [`io::Write`].
///
/// Output is compact RFC 8259 text; byte-level encoding is UTF-8 because
/// serde_json only emits UTF-8.
#[derive(Debug)]
pub struct TextSink<W: Write> {
    out: W,
    formatter: CompactFormatter,
    frames: Vec<Frame>,
    /// A complete top-level value has been written.
    root_done: bool,
    closed: bool,
}

impl<W: Write> TextSink<W> {
    /// Wrap a destination writer.
    pub fn new(out: W) -> Self {
        TextSink {
            out,
            formatter: CompactFormatter,
            frames: Vec::with_capacity(8),
            root_done: false,
            closed: false,
        }
    }

    /// Consume the sink and hand back the destination writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Number of containers currently open on this sink.
    pub fn open_containers(&self) -> usize {
        self.frames.len()
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::other("sink is closed"));
        }
        Ok(())
    }

    fn misuse(message: &'static str) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, message)
    }

    /// Emit the prefix tokens for a value in the current context.
    fn begin_value(&mut self) -> io::Result<()> {
        self.check_open()?;
        match self.frames.last_mut() {
            Some(Frame::Array { has_members }) => {
                let first = !*has_members;
                *has_members = true;
                self.formatter.begin_array_value(&mut self.out, first)
            }
            Some(Frame::Object { pending_value, .. }) => {
                if !*pending_value {
                    return Err(Self::misuse("value inside an object needs a member name"));
                }
                // begin_object_value already ran when the name was written
                Ok(())
            }
            None => {
                if self.root_done {
                    return Err(Self::misuse("second top-level value"));
                }
                Ok(())
            }
        }
    }

    /// Emit the suffix tokens after a complete value in the current context.
    fn end_value(&mut self) -> io::Result<()> {
        match self.frames.last_mut() {
            Some(Frame::Array { .. }) => self.formatter.end_array_value(&mut self.out),
            Some(Frame::Object { pending_value, .. }) => {
                *pending_value = false;
                self.formatter.end_object_value(&mut self.out)
            }
            None => {
                self.root_done = true;
                Ok(())
            }
        }
    }

    fn serialize_into<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value).map_err(io::Error::from)
    }
}

impl<W: Write> JsonSink for TextSink<W> {
    fn begin_array(&mut self) -> io::Result<()> {
        self.begin_value()?;
        self.formatter.begin_array(&mut self.out)?;
        self.frames.push(Frame::Array { has_members: false });
        Ok(())
    }

    fn end_array(&mut self) -> io::Result<()> {
        self.check_open()?;
        match self.frames.last() {
            Some(Frame::Array { .. }) => {
                self.frames.pop();
                self.formatter.end_array(&mut self.out)?;
                self.end_value()
            }
            Some(Frame::Object { .. }) => Err(Self::misuse("end_array inside an object")),
            None => Err(Self::misuse("no open array to end")),
        }
    }

    fn begin_object(&mut self) -> io::Result<()> {
        self.begin_value()?;
        self.formatter.begin_object(&mut self.out)?;
        self.frames.push(Frame::Object {
            has_members: false,
            pending_value: false,
        });
        Ok(())
    }

    fn end_object(&mut self) -> io::Result<()> {
        self.check_open()?;
        match self.frames.last() {
            Some(Frame::Object { pending_value, .. }) => {
                if *pending_value {
                    return Err(Self::misuse("member name has no value"));
                }
                self.frames.pop();
                self.formatter.end_object(&mut self.out)?;
                self.end_value()
            }
            Some(Frame::Array { .. }) => Err(Self::misuse("end_object inside an array")),
            None => Err(Self::misuse("no open object to end")),
        }
    }

    fn field_name(&mut self, name: &str) -> io::Result<()> {
        self.check_open()?;
        let first = match self.frames.last_mut() {
            Some(Frame::Object {
                has_members,
                pending_value,
            }) => {
                if *pending_value {
                    return Err(Self::misuse("member name written twice"));
                }
                let first = !*has_members;
                *has_members = true;
                *pending_value = true;
                first
            }
            _ => return Err(Self::misuse("member name outside of an object")),
        };
        self.formatter.begin_object_key(&mut self.out, first)?;
        self.serialize_into(name)?;
        self.formatter.end_object_key(&mut self.out)?;
        self.formatter.begin_object_value(&mut self.out)
    }

    fn null_value(&mut self) -> io::Result<()> {
        self.begin_value()?;
        self.formatter.write_null(&mut self.out)?;
        self.end_value()
    }

    fn bool_value(&mut self, value: bool) -> io::Result<()> {
        self.begin_value()?;
        self.formatter.write_bool(&mut self.out, value)?;
        self.end_value()
    }

    fn integer_value(&mut self, value: i64) -> io::Result<()> {
        self.begin_value()?;
        self.formatter.write_i64(&mut self.out, value)?;
        self.end_value()
    }

    fn float_value(&mut self, value: f64) -> io::Result<()> {
        self.begin_value()?;
        // non-finite values have no JSON number form; the encoder emits null
        self.serialize_into(&value)?;
        self.end_value()
    }

    fn string_value(&mut self, value: &str) -> io::Result<()> {
        self.begin_value()?;
        self.serialize_into(value)?;
        self.end_value()
    }

    fn serialized_value<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        self.begin_value()?;
        self.serialize_into(value)?;
        self.end_value()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.out.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.out.flush()?;
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
