//! Output stream management
//!
//! A [`StreamManager`] always holds exactly one open output. Bytes handed
//! to it are buffered and flushed on [`drain`](StreamManager::drain);
//! [`write`](StreamManager::write) reports when the buffer has reached the
//! high-water mark so the caller can pause until it drains.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use super::error::{ReporterError, ReporterResult};

/// Writable handle returned by a [`SinkOpener`]
pub type SinkHandle = Box<dyn AsyncWrite + Send + Unpin>;

/// Opens output handles for a path
#[async_trait]
pub trait SinkOpener: Send + Sync {
    async fn open(&self, path: &Path) -> io::Result<SinkHandle>;
}

/// Opens files for appending, creating them if needed
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSinkOpener;

#[async_trait]
impl SinkOpener for FileSinkOpener {
    async fn open(&self, path: &Path) -> io::Result<SinkHandle> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Box::new(file))
    }
}

/// Position of the current output, shared with observers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStatus {
    pub path: Option<PathBuf>,
    pub bytes_queued: u64,
}

pub type SharedStreamStatus = Arc<RwLock<StreamStatus>>;

struct ActiveStream {
    handle: SinkHandle,
    path: PathBuf,
    pending: Vec<u8>,
    bytes_queued: u64,
}

impl ActiveStream {
    async fn open(opener: &dyn SinkOpener, path: PathBuf) -> ReporterResult<Self> {
        match opener.open(&path).await {
            Ok(handle) => Ok(Self {
                handle,
                path,
                pending: Vec::new(),
                bytes_queued: 0,
            }),
            Err(source) => Err(ReporterError::Open { path, source }),
        }
    }

    fn stream_error(&self, source: io::Error) -> ReporterError {
        ReporterError::Stream {
            path: self.path.clone(),
            source,
        }
    }

    async fn flush(&mut self) -> ReporterResult<()> {
        if !self.pending.is_empty() {
            if let Err(err) = self.handle.write_all(&self.pending).await {
                return Err(self.stream_error(err));
            }
            self.pending.clear();
        }
        if let Err(err) = self.handle.flush().await {
            return Err(self.stream_error(err));
        }
        Ok(())
    }

    async fn close(mut self) -> ReporterResult<()> {
        self.flush().await?;
        if let Err(err) = self.handle.shutdown().await {
            return Err(self.stream_error(err));
        }
        debug!(path = %self.path.display(), bytes = self.bytes_queued, "output closed");
        Ok(())
    }
}

/// Owns the current output of one reporter
pub struct StreamManager {
    opener: Arc<dyn SinkOpener>,
    active: ActiveStream,
    high_water_mark: usize,
    status: SharedStreamStatus,
}

impl StreamManager {
    /// Open the first output
    pub async fn open(
        opener: Arc<dyn SinkOpener>,
        path: PathBuf,
        high_water_mark: usize,
        status: SharedStreamStatus,
    ) -> ReporterResult<Self> {
        let active = ActiveStream::open(opener.as_ref(), path).await?;
        info!(path = %active.path.display(), "output opened");

        *status.write() = StreamStatus {
            path: Some(active.path.clone()),
            bytes_queued: 0,
        };

        Ok(Self {
            opener,
            active,
            high_water_mark: high_water_mark.max(1),
            status,
        })
    }

    /// Path of the current output
    pub fn path(&self) -> &Path {
        &self.active.path
    }

    /// Bytes handed to the current output since it was opened
    pub fn bytes_queued(&self) -> u64 {
        self.active.bytes_queued
    }

    /// Bytes buffered but not yet flushed
    pub fn pending_bytes(&self) -> usize {
        self.active.pending.len()
    }

    /// Buffer `bytes` for the current output
    ///
    /// Returns `false` once the buffer has reached the high-water mark; the
    /// caller should [`drain`](Self::drain) before writing more.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        self.active.pending.extend_from_slice(bytes);
        self.active.bytes_queued += bytes.len() as u64;
        self.status.write().bytes_queued = self.active.bytes_queued;
        self.active.pending.len() < self.high_water_mark
    }

    /// Flush everything buffered so far
    pub async fn drain(&mut self) -> ReporterResult<()> {
        self.active.flush().await
    }

    /// Switch to a new output
    ///
    /// Everything buffered for the old output is flushed to it first. The
    /// new output is opened before the old one is closed, not after, so a
    /// failed open leaves the old stream in place and the manager never
    /// ends up without an output. Returns the path of the old output.
    pub async fn rotate(&mut self, new_path: PathBuf) -> ReporterResult<PathBuf> {
        self.active.flush().await?;

        let next = ActiveStream::open(self.opener.as_ref(), new_path).await?;
        let previous = std::mem::replace(&mut self.active, next);
        let previous_path = previous.path.clone();

        *self.status.write() = StreamStatus {
            path: Some(self.active.path.clone()),
            bytes_queued: 0,
        };

        previous.close().await?;
        info!(
            from = %previous_path.display(),
            to = %self.active.path.display(),
            "output rotated"
        );
        Ok(previous_path)
    }

    /// Flush and close the current output
    pub async fn close(self) -> ReporterResult<()> {
        self.active.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn status() -> SharedStreamStatus {
        Arc::new(RwLock::new(StreamStatus::default()))
    }

    #[tokio::test]
    async fn test_write_signals_high_water_mark() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.001");
        let mut stream = StreamManager::open(Arc::new(FileSinkOpener), path.clone(), 8, status())
            .await
            .unwrap();

        assert!(stream.write(b"abc\n"));
        assert!(!stream.write(b"defg\n"));
        assert_eq!(stream.pending_bytes(), 9);

        stream.drain().await.unwrap();
        assert_eq!(stream.pending_bytes(), 0);
        assert_eq!(stream.bytes_queued(), 9);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc\ndefg\n");
    }

    #[tokio::test]
    async fn test_rotate_flushes_old_output_first() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("out.001");
        let second = temp_dir.path().join("out.002");
        let shared = status();
        let mut stream = StreamManager::open(Arc::new(FileSinkOpener), first.clone(), 1024, shared.clone())
            .await
            .unwrap();

        stream.write(b"one\n");
        let previous = stream.rotate(second.clone()).await.unwrap();
        stream.write(b"two\n");
        stream.close().await.unwrap();

        assert_eq!(previous, first);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "one\n");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "two\n");

        let status = shared.read().clone();
        assert_eq!(status.path, Some(second));
        assert_eq!(status.bytes_queued, 4);
    }

    #[tokio::test]
    async fn test_failed_rotation_keeps_old_output() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("out.001");
        let unreachable = temp_dir.path().join("missing").join("out.002");
        let shared = status();
        let mut stream = StreamManager::open(Arc::new(FileSinkOpener), first.clone(), 1024, shared.clone())
            .await
            .unwrap();

        stream.write(b"before\n");
        assert!(stream.rotate(unreachable).await.is_err());
        stream.write(b"after\n");
        stream.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&first).unwrap(), "before\nafter\n");
        assert_eq!(shared.read().path, Some(first));
    }

    #[tokio::test]
    async fn test_open_failure_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("out.001");
        let result = StreamManager::open(Arc::new(FileSinkOpener), path.clone(), 1024, status()).await;

        match result {
            Err(ReporterError::Open { path: failed, .. }) => assert_eq!(failed, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("open should fail"),
        }
    }
}
