//! Recurring rotation timer for time mode

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::reporter::QueueSender;

/// Background task that asks the write queue to rotate every period
///
/// Each tick is queued behind the entries already waiting, so a backlog is
/// written to the file of the interval it was emitted in.
#[derive(Debug)]
pub struct RotationTimer {
    task: Option<JoinHandle<()>>,
}

impl RotationTimer {
    /// Start the timer; the first tick fires one full period from now
    pub fn arm(period: Duration, queue: QueueSender) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // The queue is gone, nothing left to rotate
                if !queue.request_rotation().await {
                    break;
                }
            }
        });

        debug!(period_ms = period.as_millis() as u64, "rotation timer armed");
        Self { task: Some(task) }
    }

    /// Stop the timer. Safe to call any number of times.
    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("rotation timer disarmed");
        }
    }

    /// Whether the timer is still running
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
