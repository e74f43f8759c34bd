#![forbid(unsafe_code)]
//! Developer-time value reporting to a local debug collector.
//!
//! A [`DebugClient`] normalizes any [`Inspect`] value into a JSON-friendly
//! tree, attaches the call site and stack, and POSTs the event to the
//! collector (`http://127.0.0.1:3000/debug` by default) without waiting on
//! the result. Delivery problems are swallowed; reporting never disturbs the
//! host program.
//!
//! [`dev_dump!`] is the one disruptive entry point: it prints values and
//! exits with status 1.
//!
//! ```no_run
//! use dev_debug::{Bootstrap, Context};
//!
//! #[derive(dev_debug::Inspect)]
//! struct Order {
//!     pub id: u64,
//!     total_cents: i64,
//! }
//!
//! let client = Bootstrap::from_env().client();
//! client.send(&Order { id: 7, total_cents: 1299 }, Context::new().label("checkout"));
//! client.flush(std::time::Duration::from_millis(200));
//! ```

extern crate self as dev_debug;

mod bootstrap;
mod builder;
mod client;
mod config;
mod defaults;
mod dump;
mod error;
mod event;
pub mod normalize;
mod stack;
mod transport;

pub use bootstrap::{Bootstrap, ExecutionContext};
pub use builder::DebugClientBuilder;
pub use client::DebugClient;
pub use config::{Context, NormalizeConfig};
pub use dump::{dump_and_exit, render_dump, DumpArg};
pub use error::DevDebugError;
pub use event::{CallFrame, DebugEvent, EventBuilder, Payload};
pub use normalize::{
    normalize, Field, Fields, Inspect, Marker, NormalizedNode, Normalizer, Object, ObjectId,
    Scalar, StructuredObject, Visibility,
};
pub use stack::{BacktraceCapture, RawFrame, StackCapture};
pub use transport::{HttpTransport, NullTransport, Transport};

#[cfg(feature = "derive")]
pub use dev_debug_derive::Inspect;
