//! The file reporter
//!
//! - `lifecycle`: [`FileReporter`] and its state machine
//! - `queue`: the bounded write queue and its consumer task
//! - `stream`: the current output and rotation between outputs
//! - `diagnostics`: where steady-state failures are reported
//! - `stats`: counters
//! - `error`: error types

mod diagnostics;
mod error;
mod lifecycle;
mod queue;
mod stats;
mod stream;

pub use diagnostics::{CollectingSink, DiagnosticSink, TracingSink};
pub use error::{ReporterError, ReporterResult};
pub use lifecycle::{FileReporter, FileReporterBuilder, Reporter, ReporterState};
pub use queue::{queue_channel, EnqueueError, QueueExit, QueueItem, QueueSender};
pub use stats::{ReporterStats, StatsSnapshot};
pub use stream::{FileSinkOpener, SinkHandle, SinkOpener, StreamManager, StreamStatus};
