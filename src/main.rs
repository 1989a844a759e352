//! File Reporter - Binary Entry Point
//!
//! Reads newline-delimited JSON events from stdin and persists them with a
//! file reporter configured from a JSON file:
//!
//! ```text
//! file-reporter <config.json> < events.ndjson
//! ```
//!
//! Each input line is one payload; its `event` field, if present, is used
//! as the event name (default `log`). Input ends on EOF or Ctrl-C, after
//! which queued events are written out as configured by `stopMode`.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use file_reporter::utils::init_subscriber;
use file_reporter::{
    EventEmitter, FileReporter, Payload, Reporter, ReporterError, ReporterOptions,
    ReporterResult, NAME, REPORT_EVENT, VERSION,
};

/// Environment variable consulted when no config path is given
const CONFIG_ENV: &str = "FILE_REPORTER_CONFIG";

/// Event name used for lines without an `event` field
const DEFAULT_EVENT_NAME: &str = "log";

#[tokio::main]
async fn main() -> ReporterResult<()> {
    init_subscriber("info");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .ok_or_else(|| {
            ReporterError::Config(format!("usage: {NAME} <config.json> (or set {CONFIG_ENV})"))
        })?;

    let options = ReporterOptions::from_file(&config_path)?;
    let reporter = FileReporter::from_options(&options)?;
    let emitter = Arc::new(EventEmitter::new());

    info!(version = VERSION, config = %config_path, "starting");
    reporter.start(emitter.clone()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => forward(&emitter, &line).await,
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read input");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    reporter.stop().await
}

async fn forward(emitter: &EventEmitter, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "skipping malformed input line");
            return;
        }
    };

    let name = value
        .get("event")
        .and_then(|event| event.as_str())
        .unwrap_or(DEFAULT_EVENT_NAME)
        .to_string();
    emitter.emit(REPORT_EVENT, &name, &Payload::from(value)).await;
}
