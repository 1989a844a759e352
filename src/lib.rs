//! File Reporter
//!
//! A reporter that subscribes to a host's event stream and appends every
//! event as one line of JSON to a file, rotating to a new file by size or
//! on a fixed interval.
//!
//! # Features
//!
//! - **Sequential naming**: `<base>.001`, `<base>.002`, ... continuing after
//!   the highest suffix already on disk
//! - **Size or time rotation**: rotate before a write that would reach
//!   `maxLogSize`, or every `rotationTime` days
//! - **Ordered, bounded writes**: one consumer task per reporter, with a
//!   bounded queue and high-water-mark backpressure
//! - **Cycle-safe serialization**: self-referencing payloads are written
//!   with a `[Circular ~]` marker
//! - **Fail-stop**: a stream error detaches the reporter and is reported
//!   exactly once to its diagnostic sink
//!
//! # Modules
//!
//! - `config`: option parsing and validation
//! - `reporter`: lifecycle, write queue and output stream
//! - `rotation`: file naming, suffix discovery, rotation policy and timer
//! - `serializer`: payload to JSON line
//! - `source`: event source boundary and an in-process emitter
//! - `types`: payloads and queue entries
//! - `utils`: time helpers and tracing setup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use file_reporter::{EventEmitter, FileReporter, Payload, Reporter, ReporterOptions, REPORT_EVENT};
//!
//! # async fn run() -> file_reporter::ReporterResult<()> {
//! let options = ReporterOptions::from_json_str(r#"{"file": "./logs/app", "maxLogSize": 1048576}"#)?;
//! let reporter = FileReporter::from_options(&options)?;
//! let emitter = Arc::new(EventEmitter::new());
//!
//! reporter.start(emitter.clone()).await?;
//! emitter.emit(REPORT_EVENT, "log", &Payload::from("hello")).await;
//! reporter.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reporter;
pub mod rotation;
pub mod serializer;
pub mod source;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{ReporterConfig, ReporterOptions, ReporterSettings, StopMode};
pub use reporter::{
    DiagnosticSink, FileReporter, Reporter, ReporterError, ReporterResult, ReporterState,
    StatsSnapshot,
};
pub use rotation::{RotationConfig, RotationTarget};
pub use serializer::{EventSerializer, SafeJsonSerializer};
pub use source::{EventEmitter, EventFilter, EventHandler, EventSource, REPORT_EVENT};
pub use types::{Payload, QueueEntry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
