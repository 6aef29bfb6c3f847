//! Client-side event packets for an error-reporting service.
//!
//! An [`EventRecord`] describes one error or log occurrence in the
//! service's JSON ingestion schema. Records are built from a caught
//! [`Exception`] (including its cause chain) or as plain log events, then
//! serialized and handed to an [`EventSink`]. [`RavenClient`] ties the
//! pieces together and [`layer::EventLayer`] does the same for `tracing`
//! events.

pub mod level;
pub mod exception;
pub mod context;
pub mod record;
pub mod error;
mod host;

pub mod config;
pub mod env;
pub mod dsn;
pub mod sink;
pub mod noop_sink;

#[cfg(feature = "http")]
pub mod http;

pub mod client;
pub mod layer;
pub mod init;

pub use client::RavenClient;
pub use config::ClientConfig;
pub use context::{AmbientContext, RequestContext, StaticContext, UserContext};
pub use exception::{CapturedException, Exception, Origin};
pub use level::ErrorLevel;
pub use record::{EventRecord, ExceptionFrame};
pub use sink::{EventSink, Packet};
