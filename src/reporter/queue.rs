//! The write queue
//!
//! Serialized events go through a bounded channel to a single consumer
//! task that owns the output stream. The consumer is the only place that
//! writes or rotates. Timed rotations travel through the same channel as
//! entries, so a rotation lands between the events emitted before and after
//! it even when a backlog is queued.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::error::ReporterResult;
use super::stats::ReporterStats;
use super::stream::StreamManager;
use crate::rotation::{FileNamer, RotationPolicy};
use crate::types::QueueEntry;

/// One unit of work for the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    /// Write a serialized event
    Entry(QueueEntry),
    /// Switch to a new output before the next entry
    Rotate,
}

/// Create the queue's channel pair
pub fn queue_channel(capacity: usize) -> (QueueSender, mpsc::Receiver<QueueItem>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueSender { tx }, rx)
}

/// Why an entry was not accepted; the entry is handed back
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("write queue is full")]
    Full(QueueEntry),
    #[error("write queue is closed")]
    Closed(QueueEntry),
}

impl EnqueueError {
    pub fn into_entry(self) -> QueueEntry {
        match self {
            EnqueueError::Full(entry) | EnqueueError::Closed(entry) => entry,
        }
    }
}

/// Producer side of the write queue
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<QueueItem>,
}

impl QueueSender {
    /// Enqueue, waiting for room if the queue is full
    ///
    /// Waiting producers are served in the order they started waiting.
    pub async fn enqueue(&self, entry: QueueEntry) -> Result<(), EnqueueError> {
        match self.tx.reserve().await {
            Ok(permit) => {
                permit.send(QueueItem::Entry(entry));
                Ok(())
            }
            Err(_) => Err(EnqueueError::Closed(entry)),
        }
    }

    /// Enqueue without waiting
    pub fn try_enqueue(&self, entry: QueueEntry) -> Result<(), EnqueueError> {
        match self.tx.try_reserve() {
            Ok(permit) => {
                permit.send(QueueItem::Entry(entry));
                Ok(())
            }
            Err(TrySendError::Full(())) => Err(EnqueueError::Full(entry)),
            Err(TrySendError::Closed(())) => Err(EnqueueError::Closed(entry)),
        }
    }

    /// Queue a rotation behind everything enqueued so far. Returns `false`
    /// once the consumer is gone.
    pub(crate) async fn request_rotation(&self) -> bool {
        self.tx.send(QueueItem::Rotate).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// How the consumer finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueExit {
    /// Every producer went away and all entries were written
    Drained,
    /// Cancelled; entries still queued were dropped
    Discarded { dropped: u64 },
}

/// Consumer side of the write queue
pub(crate) struct WriteQueue {
    items: mpsc::Receiver<QueueItem>,
    stream: StreamManager,
    policy: RotationPolicy,
    namer: FileNamer,
    cancel: CancellationToken,
    stats: Arc<ReporterStats>,
}

impl WriteQueue {
    pub(crate) fn new(
        items: mpsc::Receiver<QueueItem>,
        stream: StreamManager,
        policy: RotationPolicy,
        namer: FileNamer,
        cancel: CancellationToken,
        stats: Arc<ReporterStats>,
    ) -> Self {
        Self {
            items,
            stream,
            policy,
            namer,
            cancel,
            stats,
        }
    }

    /// Process items until every sender is dropped or the token is
    /// cancelled. Returns the first stream error; the output is left as is.
    pub(crate) async fn run(mut self) -> ReporterResult<QueueExit> {
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    let dropped = self.discard_pending();
                    self.stream.close().await?;
                    return Ok(QueueExit::Discarded { dropped });
                }

                item = self.items.recv() => match item {
                    Some(QueueItem::Entry(entry)) => self.process(entry).await?,
                    Some(QueueItem::Rotate) => self.rotate().await?,
                    None => break,
                },
            }
        }

        self.stream.close().await?;
        Ok(QueueExit::Drained)
    }

    async fn process(&mut self, entry: QueueEntry) -> ReporterResult<()> {
        if self.policy.should_rotate(self.stream.bytes_queued(), entry.length) {
            self.rotate().await?;
        }

        let accepted = self.stream.write(&entry.payload);
        self.stats.record_write(entry.length);

        if !accepted {
            trace!(pending = self.stream.pending_bytes(), "high-water mark reached, draining");
            self.stream.drain().await?;
        } else if self.items.is_empty() {
            self.stream.drain().await?;
        }
        Ok(())
    }

    async fn rotate(&mut self) -> ReporterResult<()> {
        let path = self.namer.next_path();
        self.stream.rotate(path).await?;
        self.stats.record_rotation();
        Ok(())
    }

    fn discard_pending(&mut self) -> u64 {
        self.items.close();
        let mut dropped = 0;
        while let Ok(item) = self.items.try_recv() {
            if matches!(item, QueueItem::Entry(_)) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(dropped, "discarded queued events");
            self.stats.record_discarded(dropped);
        }
        dropped
    }
}
