//! Reporter configuration
//!
//! Options arrive either as a bare location string or as an object with
//! camelCase keys (`path`, `file`, `maxLogSize`, `rotationTime`, ...).
//! [`ReporterOptions::resolve`] validates them and produces the immutable
//! [`ReporterSettings`] a reporter is built from.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::reporter::{ReporterError, ReporterResult};
use crate::rotation::{
    normalize_extension, sanitize_component, RotationConfig, RotationTarget,
    DEFAULT_DATED_EXTENSION, DEFAULT_EXTENSION,
};
use crate::source::EventFilter;
use crate::utils::time::{days_to_duration, is_valid_format};

/// Default number of entries the write queue holds before `enqueue` waits
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default number of buffered bytes at which the stream reports backpressure
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// What `stop` does with entries still queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    /// Write everything enqueued before `stop`, then close
    #[default]
    Drain,
    /// Close after the entry in progress; the rest of the queue is dropped
    Discard,
}

/// Write queue sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Entries buffered between the event handler and the writer
    pub capacity: usize,
    /// Buffered bytes at which a write is refused until drained
    pub high_water_mark: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

/// Fully resolved settings of one reporter instance
#[derive(Debug, Clone)]
pub struct ReporterSettings {
    pub target: RotationTarget,
    pub rotation: RotationConfig,
    pub queue: QueueConfig,
    pub stop_mode: StopMode,
    pub events: EventFilter,
}

impl ReporterSettings {
    /// Settings with no rotation, default queue sizing and drain-on-stop
    pub fn new(target: RotationTarget) -> Self {
        Self {
            target,
            rotation: RotationConfig::default(),
            queue: QueueConfig::default(),
            stop_mode: StopMode::default(),
            events: EventFilter::all(),
        }
    }

    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_stop_mode(mut self, stop_mode: StopMode) -> Self {
        self.stop_mode = stop_mode;
        self
    }

    pub fn with_events(mut self, events: EventFilter) -> Self {
        self.events = events;
        self
    }
}

/// Options object as written in configuration files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReporterConfig {
    /// Directory receiving timestamp- or date-named files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Fixed base name; files get a numeric sequence suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Size threshold in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_log_size: Option<u64>,
    /// Rotation interval in (fractional) days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// strftime pattern for date-named files, e.g. `%Y-%m-%d`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "EventFilter::is_empty")]
    pub events: EventFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_mode: Option<StopMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_water_mark: Option<usize>,
}

impl ReporterConfig {
    /// Config for a fixed-name target
    pub fn file<P: AsRef<Path>>(file: P) -> Self {
        Self {
            file: Some(file.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Config for a directory target
    pub fn directory<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Validate and resolve into settings
    pub fn resolve(&self) -> ReporterResult<ReporterSettings> {
        let target = self.resolve_target()?;
        let rotation = self.resolve_rotation()?;

        let invalid = self.events.invalid_entries();
        if !invalid.is_empty() {
            return Err(ReporterError::Config(format!(
                "events must map to \"*\" or a list of tags: {}",
                invalid.join(", ")
            )));
        }

        let queue = QueueConfig {
            capacity: positive(self.queue_capacity, DEFAULT_QUEUE_CAPACITY, "queueCapacity")?,
            high_water_mark: positive(
                self.high_water_mark,
                DEFAULT_HIGH_WATER_MARK,
                "highWaterMark",
            )?,
        };

        Ok(ReporterSettings {
            target,
            rotation,
            queue,
            stop_mode: self.stop_mode.unwrap_or_default(),
            events: self.events.clone(),
        })
    }

    fn resolve_target(&self) -> ReporterResult<RotationTarget> {
        match (&self.path, &self.file) {
            (Some(_), Some(_)) => Err(ReporterError::Config(
                "only one of `path` and `file` may be set".to_string(),
            )),
            (None, None) => Err(ReporterError::Config(
                "`path` or `file` is required".to_string(),
            )),
            (None, Some(file)) => {
                if file.as_os_str().is_empty() {
                    return Err(ReporterError::Config("`file` must not be empty".to_string()));
                }
                if self.extension.is_some() || self.name_format.is_some() || self.prefix.is_some() {
                    warn!(
                        file = %file.display(),
                        "extension, nameFormat and prefix only apply to directory targets"
                    );
                }
                Ok(RotationTarget::file(file))
            }
            (Some(path), None) => {
                if path.as_os_str().is_empty() {
                    return Err(ReporterError::Config("`path` must not be empty".to_string()));
                }

                if let Some(format) = &self.name_format {
                    if format.is_empty() || !is_valid_format(format) {
                        return Err(ReporterError::Config(format!(
                            "nameFormat {format:?} is not a valid date format"
                        )));
                    }
                }

                let default_extension = if self.name_format.is_some() {
                    DEFAULT_DATED_EXTENSION
                } else {
                    DEFAULT_EXTENSION
                };
                let extension = normalize_extension(
                    self.extension.as_deref().unwrap_or(default_extension),
                );
                if extension.is_empty() {
                    return Err(ReporterError::Config("extension must not be empty".to_string()));
                }

                let prefix = self
                    .prefix
                    .as_deref()
                    .map(sanitize_component)
                    .filter(|prefix| !prefix.is_empty());

                Ok(RotationTarget::Directory {
                    directory: path.clone(),
                    prefix,
                    extension,
                    name_format: self.name_format.clone(),
                })
            }
        }
    }

    fn resolve_rotation(&self) -> ReporterResult<RotationConfig> {
        if self.max_log_size == Some(0) {
            return Err(ReporterError::Config(
                "maxLogSize must be a positive number of bytes".to_string(),
            ));
        }

        let interval = match self.rotation_time {
            Some(days) => Some(days_to_duration(days).ok_or_else(|| {
                ReporterError::Config(format!(
                    "rotationTime must be a positive number of days, got {days}"
                ))
            })?),
            None => None,
        };

        if interval.is_some() && self.max_log_size.is_some() {
            warn!("rotationTime is set, ignoring maxLogSize");
        }

        Ok(RotationConfig::new(self.max_log_size, interval))
    }
}

fn positive(value: Option<usize>, default: usize, key: &str) -> ReporterResult<usize> {
    match value {
        Some(0) => Err(ReporterError::Config(format!("{key} must be greater than zero"))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

/// Reporter options: a bare location or a full options object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReporterOptions {
    /// A path ending in a separator is a directory, anything else a file
    Location(String),
    Config(ReporterConfig),
}

impl ReporterOptions {
    /// Parse options from a JSON document
    pub fn from_json_str(json: &str) -> ReporterResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ReporterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Turn the options into a config object
    pub fn to_config(&self) -> ReporterResult<ReporterConfig> {
        match self {
            ReporterOptions::Config(config) => Ok(config.clone()),
            ReporterOptions::Location(location) if location.is_empty() => Err(
                ReporterError::Config("location must not be empty".to_string()),
            ),
            ReporterOptions::Location(location) => {
                if location.ends_with('/') || location.ends_with(MAIN_SEPARATOR) {
                    Ok(ReporterConfig::directory(location))
                } else {
                    Ok(ReporterConfig::file(location))
                }
            }
        }
    }

    /// Validate and resolve into settings
    pub fn resolve(&self) -> ReporterResult<ReporterSettings> {
        self.to_config()?.resolve()
    }
}

impl From<ReporterConfig> for ReporterOptions {
    fn from(config: ReporterConfig) -> Self {
        ReporterOptions::Config(config)
    }
}
