//! jrender core - fluent streaming JSON renderer.
//!
//! A chainable `object()/key()/value()/end_object()` builder that produces
//! JSON text by forwarding every call to a streaming token sink. The
//! renderer owns exactly one piece of logic: the nesting state machine that
//! rejects out-of-order calls. Encoding - escaping, number formatting,
//! commas, flushing - is the sink's business, and the shipped sink hands it
//! all to serde_json.
//!
//! # Architecture
//!
//! - **render.rs** - JsonRenderer, the nesting state machine, RenderPairs
//! - **sink.rs** - JsonSink capability trait, serde_json-backed TextSink
//! - **value.rs** - borrowed scalar Value enum
//! - **level.rs** - RenderLevel verbosity policy
//! - **error.rs** - SequenceError / RenderError taxonomy
//! - **factory.rs** - injectable RendererFactory
//!
//! # Example
//!
//! ```
//! use jrender_core::RendererFactory;
//!
//! let factory = RendererFactory::new();
//! let mut r = factory.buffered();
//! r.object()?
//!     .key("name")?
//!     .value("udon")?
//!     .key("servings")?
//!     .value(2)?
//!     .key("tags")?
//!     .array()?
//!     .value("noodles")?
//!     .value("soup")?
//!     .end_array()?
//! .end_object()?;
//! assert_eq!(
//!     r.build()?,
//!     r#"{"name":"udon","servings":2,"tags":["noodles","soup"]}"#
//! );
//! # Ok::<(), jrender_core::RenderError>(())
//! ```

pub mod error;
pub mod factory;
pub mod level;
pub mod render;
pub mod sink;
pub mod value;

pub use error::{RenderError, SequenceError};
pub use factory::RendererFactory;
pub use level::RenderLevel;
pub use render::{BufferedRenderer, JsonRenderer, RenderPairs, StreamRenderer};
pub use sink::{JsonSink, TextSink};
pub use value::Value;
