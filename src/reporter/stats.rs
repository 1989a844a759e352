//! Reporter statistics
//!
//! Counters are updated by the event handler (enqueued) and the write
//! queue (everything else) and can be read at any time.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters of one reporter instance
#[derive(Debug, Default)]
pub struct ReporterStats {
    events_enqueued: AtomicU64,
    events_written: AtomicU64,
    events_discarded: AtomicU64,
    bytes_written: AtomicU64,
    files_opened: AtomicU64,
    rotations: AtomicU64,
}

impl ReporterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, bytes: u64) {
        self.events_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: u64) {
        self.events_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_file_opened(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
        self.record_file_opened();
    }

    /// Copy the current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            files_opened: self.files_opened.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ReporterStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Events accepted into the write queue
    pub events_enqueued: u64,
    /// Events handed to the output stream
    pub events_written: u64,
    /// Queued events dropped by a discarding stop
    pub events_discarded: u64,
    /// Bytes handed to the output stream
    pub bytes_written: u64,
    /// Output files opened, the first one included
    pub files_opened: u64,
    pub rotations: u64,
}

impl StatsSnapshot {
    /// Format size in human-readable format
    pub fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.2} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} B", bytes)
        }
    }
}
