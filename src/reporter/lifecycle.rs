//! Reporter lifecycle
//!
//! A [`FileReporter`] moves through
//! `constructed -> starting -> active -> stopping -> stopped`, or into
//! `failed` when startup or the output stream fails. While active it is
//! subscribed to its event source and every forwarded event is serialized
//! and handed to the write queue.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::diagnostics::{DiagnosticSink, TracingSink};
use super::error::{ReporterError, ReporterResult};
use super::queue::{queue_channel, QueueSender, WriteQueue};
use super::stats::{ReporterStats, StatsSnapshot};
use super::stream::{FileSinkOpener, SharedStreamStatus, SinkOpener, StreamManager, StreamStatus};
use crate::config::{ReporterOptions, ReporterSettings, StopMode};
use crate::rotation::{FileNamer, RotationTimer};
use crate::serializer::{EventSerializer, SafeJsonSerializer};
use crate::source::{EventHandler, EventSource, SubscriptionId, REPORT_EVENT};
use crate::types::{Payload, QueueEntry};

/// Lifecycle state of a reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterState {
    Constructed,
    Starting,
    Active,
    Stopping,
    Stopped,
    Failed,
}

impl ReporterState {
    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReporterState::Stopped | ReporterState::Failed)
    }
}

impl fmt::Display for ReporterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReporterState::Constructed => "constructed",
            ReporterState::Starting => "starting",
            ReporterState::Active => "active",
            ReporterState::Stopping => "stopping",
            ReporterState::Stopped => "stopped",
            ReporterState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A component that persists events forwarded by an [`EventSource`]
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Prepare the output and subscribe to `source`
    async fn start(&self, source: Arc<dyn EventSource>) -> ReporterResult<()>;

    /// Unsubscribe and release the output. Idempotent.
    async fn stop(&self) -> ReporterResult<()>;

    /// Persist one event. Ignored unless the reporter is active.
    async fn handle_event(&self, name: &str, payload: &Payload);
}

/// State shared between the reporter handle, its event handler and its
/// write queue task
struct Shared {
    settings: ReporterSettings,
    serializer: Arc<dyn EventSerializer>,
    diagnostics: Arc<dyn DiagnosticSink>,
    state: watch::Sender<ReporterState>,
    accepting: AtomicBool,
    ingress: Mutex<Option<QueueSender>>,
    subscription: Mutex<Option<(Arc<dyn EventSource>, SubscriptionId)>>,
    status: SharedStreamStatus,
    stats: Arc<ReporterStats>,
}

impl Shared {
    fn state(&self) -> ReporterState {
        *self.state.borrow()
    }

    fn set_state(&self, state: ReporterState) {
        self.state.send_replace(state);
    }

    async fn handle_event(&self, name: &str, payload: &Payload) {
        if !self.accepting.load(Ordering::SeqCst) {
            return;
        }
        if !self.settings.events.matches(name, payload) {
            trace!(event = name, "event filtered out");
            return;
        }
        let ingress = self.ingress.lock().clone();
        let Some(ingress) = ingress else {
            return;
        };

        let line = self.serializer.serialize(name, payload);
        match ingress.enqueue(QueueEntry::from_line(&line)).await {
            Ok(()) => self.stats.record_enqueued(),
            Err(err) => trace!(event = name, error = %err, "event not enqueued"),
        }
    }

    /// Stop taking events: unsubscribe and release the queue sender
    fn detach(&self) {
        self.accepting.store(false, Ordering::SeqCst);

        let subscription = self.subscription.lock().take();
        if let Some((source, id)) = subscription {
            source.unsubscribe(REPORT_EVENT, id);
            debug!(subscription = %id, "unsubscribed from event source");
        }

        self.ingress.lock().take();
    }

    /// Fail-stop after a stream error
    fn fail(&self, err: ReporterError) {
        self.detach();
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                false
            } else {
                *state = ReporterState::Failed;
                true
            }
        });
        self.diagnostics.report(&err);
    }
}

#[async_trait]
impl EventHandler for Shared {
    async fn on_event(&self, name: &str, payload: &Payload) {
        self.handle_event(name, payload).await;
    }
}

/// Parts that only exist while the reporter runs
#[derive(Default)]
struct Runtime {
    timer: Option<RotationTimer>,
    consumer: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

/// Builder for [`FileReporter`]
pub struct FileReporterBuilder {
    settings: ReporterSettings,
    serializer: Arc<dyn EventSerializer>,
    diagnostics: Arc<dyn DiagnosticSink>,
    opener: Arc<dyn SinkOpener>,
}

impl FileReporterBuilder {
    pub fn serializer(mut self, serializer: Arc<dyn EventSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replace how output files are opened
    pub fn opener(mut self, opener: Arc<dyn SinkOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn build(self) -> FileReporter {
        let (state, _) = watch::channel(ReporterState::Constructed);
        FileReporter {
            shared: Arc::new(Shared {
                settings: self.settings,
                serializer: self.serializer,
                diagnostics: self.diagnostics,
                state,
                accepting: AtomicBool::new(false),
                ingress: Mutex::new(None),
                subscription: Mutex::new(None),
                status: Arc::new(RwLock::new(StreamStatus::default())),
                stats: Arc::new(ReporterStats::new()),
            }),
            opener: self.opener,
            runtime: tokio::sync::Mutex::new(Runtime::default()),
        }
    }
}

/// Reporter that appends serialized events to rotating files
pub struct FileReporter {
    shared: Arc<Shared>,
    opener: Arc<dyn SinkOpener>,
    runtime: tokio::sync::Mutex<Runtime>,
}

impl FileReporter {
    /// Reporter with the default serializer, sink and file opener
    pub fn new(settings: ReporterSettings) -> Self {
        Self::builder(settings).build()
    }

    /// Validate `options` and build a reporter from them
    pub fn from_options(options: &ReporterOptions) -> ReporterResult<Self> {
        Ok(Self::new(options.resolve()?))
    }

    pub fn builder(settings: ReporterSettings) -> FileReporterBuilder {
        FileReporterBuilder {
            settings,
            serializer: Arc::new(SafeJsonSerializer::new()),
            diagnostics: Arc::new(TracingSink),
            opener: Arc::new(FileSinkOpener),
        }
    }

    pub fn settings(&self) -> &ReporterSettings {
        &self.shared.settings
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReporterState {
        self.shared.state()
    }

    /// Watch lifecycle transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ReporterState> {
        self.shared.state.subscribe()
    }

    /// Path of the file currently written, once started
    pub fn current_path(&self) -> Option<PathBuf> {
        self.shared.status.read().path.clone()
    }

    /// Bytes handed to the current file since it was opened
    pub fn current_bytes(&self) -> u64 {
        self.shared.status.read().bytes_queued
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    async fn launch(&self, runtime: &mut Runtime, source: Arc<dyn EventSource>) -> ReporterResult<()> {
        let settings = &self.shared.settings;

        let mut namer = FileNamer::discover(settings.target.clone()).await?;
        let first = namer.next_path();
        let stream = StreamManager::open(
            self.opener.clone(),
            first,
            settings.queue.high_water_mark,
            self.shared.status.clone(),
        )
        .await?;
        self.shared.stats.record_file_opened();

        let (ingress, entries) = queue_channel(settings.queue.capacity);
        if let Some(period) = settings.rotation.interval() {
            runtime.timer = Some(RotationTimer::arm(period, ingress.clone()));
        }
        let cancel = CancellationToken::new();
        let queue = WriteQueue::new(
            entries,
            stream,
            settings.rotation.policy(),
            namer,
            cancel.clone(),
            self.shared.stats.clone(),
        );

        *self.shared.ingress.lock() = Some(ingress);
        self.shared.accepting.store(true, Ordering::SeqCst);
        self.shared.set_state(ReporterState::Active);

        let shared = self.shared.clone();
        runtime.consumer = Some(tokio::spawn(async move {
            match queue.run().await {
                Ok(exit) => debug!(?exit, "write queue finished"),
                Err(err) => shared.fail(err),
            }
        }));
        runtime.cancel = Some(cancel);

        let handler: Arc<dyn EventHandler> = self.shared.clone();
        let id = source.subscribe(REPORT_EVENT, handler);
        *self.shared.subscription.lock() = Some((source, id));
        debug!(subscription = %id, "subscribed to event source");

        Ok(())
    }
}

#[async_trait]
impl Reporter for FileReporter {
    async fn start(&self, source: Arc<dyn EventSource>) -> ReporterResult<()> {
        let mut runtime = self.runtime.lock().await;

        let current = self.shared.state();
        if current != ReporterState::Constructed {
            return Err(ReporterError::InvalidState {
                operation: "start",
                state: current,
            });
        }
        self.shared.set_state(ReporterState::Starting);

        match self.launch(&mut runtime, source).await {
            Ok(()) => {
                info!(path = ?self.current_path(), "file reporter started");
                Ok(())
            }
            Err(err) => {
                self.shared.set_state(ReporterState::Failed);
                warn!(error = %err, "file reporter failed to start");
                Err(err)
            }
        }
    }

    async fn stop(&self) -> ReporterResult<()> {
        let mut runtime = self.runtime.lock().await;

        match self.shared.state() {
            ReporterState::Constructed => {
                self.shared.set_state(ReporterState::Stopped);
                return Ok(());
            }
            ReporterState::Stopped => return Ok(()),
            ReporterState::Failed => {}
            _ => self.shared.set_state(ReporterState::Stopping),
        }

        self.shared.detach();
        if let Some(timer) = runtime.timer.as_mut() {
            timer.disarm();
        }
        if self.shared.settings.stop_mode == StopMode::Discard {
            if let Some(cancel) = &runtime.cancel {
                cancel.cancel();
            }
        }

        let joined = match runtime.consumer.take() {
            Some(consumer) => consumer.await,
            None => Ok(()),
        };

        self.shared.state.send_if_modified(|state| {
            if *state == ReporterState::Stopping {
                *state = ReporterState::Stopped;
                true
            } else {
                false
            }
        });

        let stats = self.stats();
        info!(
            state = %self.state(),
            events = stats.events_written,
            written = %StatsSnapshot::format_size(stats.bytes_written),
            files = stats.files_opened,
            "file reporter stopped"
        );

        joined.map_err(|err| ReporterError::Internal(format!("write queue task failed: {err}")))
    }

    async fn handle_event(&self, name: &str, payload: &Payload) {
        self.shared.handle_event(name, payload).await;
    }
}

impl Drop for FileReporter {
    fn drop(&mut self) {
        // Lets a running write queue drain and close on its own
        self.shared.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::RotationTarget;
    use crate::source::EventEmitter;
    use tempfile::TempDir;

    fn reporter(temp_dir: &TempDir) -> FileReporter {
        FileReporter::new(ReporterSettings::new(RotationTarget::file(
            temp_dir.path().join("events"),
        )))
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ReporterState::Active.to_string(), "active");
        assert_eq!(ReporterState::Failed.to_string(), "failed");
        assert!(ReporterState::Stopped.is_terminal());
        assert!(!ReporterState::Stopping.is_terminal());
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = reporter(&temp_dir);

        reporter.stop().await.unwrap();
        assert_eq!(reporter.state(), ReporterState::Stopped);

        let err = reporter
            .start(Arc::new(EventEmitter::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ReporterError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_events_ignored_unless_active() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = reporter(&temp_dir);

        reporter.handle_event("log", &Payload::from("early")).await;
        assert_eq!(reporter.stats().events_enqueued, 0);

        let emitter = Arc::new(EventEmitter::new());
        reporter.start(emitter.clone()).await.unwrap();
        assert_eq!(emitter.listener_count(REPORT_EVENT), 1);

        reporter.handle_event("log", &Payload::from("direct")).await;
        reporter.stop().await.unwrap();
        assert_eq!(emitter.listener_count(REPORT_EVENT), 0);

        reporter.handle_event("log", &Payload::from("late")).await;
        let stats = reporter.stats();
        assert_eq!(stats.events_enqueued, 1);
        assert_eq!(stats.events_written, 1);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = reporter(&temp_dir);
        let emitter = Arc::new(EventEmitter::new());

        reporter.start(emitter.clone()).await.unwrap();
        let err = reporter.start(emitter.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot start a reporter in state active");

        reporter.stop().await.unwrap();
        assert_eq!(emitter.listener_count(REPORT_EVENT), 0);
    }
}
