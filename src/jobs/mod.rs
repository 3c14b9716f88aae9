//! Scheduled Jobs
//!
//! The periodic check pass: roll past-due subscriptions forward, then send
//! reminders for upcoming payments. Fires on a cron schedule in local time.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use cron::Schedule;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::services::{CheckReport, ServiceError, SubscriptionService};

/// Twice a day, 09:00 and 21:00
pub const DEFAULT_CHECK_SCHEDULE: &str = "0 0 9,21 * * *";

/// Configuration for the check scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Six-field cron expression (sec min hour day month weekday)
    pub schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_CHECK_SCHEDULE.to_string(),
        }
    }
}

/// Runs check passes on a schedule
pub struct CheckScheduler {
    service: Arc<SubscriptionService>,
    schedule: Schedule,
}

impl CheckScheduler {
    /// Create a scheduler with the default twice-daily cadence
    pub fn new(service: Arc<SubscriptionService>) -> Result<Self, SchedulerError> {
        Self::with_config(service, SchedulerConfig::default())
    }

    pub fn with_config(
        service: Arc<SubscriptionService>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        let schedule = Schedule::from_str(&config.schedule).map_err(|e| {
            SchedulerError::InvalidSchedule {
                expression: config.schedule.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self { service, schedule })
    }

    /// Next fire time strictly after `after`
    pub fn next_run_after(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(&after).next()
    }

    /// Start the scheduler in the background
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(stop_rx).await;
        });

        SchedulerHandle { stop_tx, task }
    }

    async fn run(&self, mut stop_rx: watch::Receiver<bool>) {
        tracing::info!("Check scheduler started");

        loop {
            let now = Local::now();
            let Some(next) = self.next_run_after(now) else {
                tracing::warn!("Schedule has no future fire times, scheduler exiting");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next_run = %next, "Waiting for next check");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = self.run_once(Utc::now()).await {
                        tracing::error!(error = %e, "Scheduled check failed");
                    }
                }
                _ = stop_rx.changed() => break,
            }
        }

        tracing::info!("Check scheduler stopped");
    }

    /// Run a single check pass at `now` (manual trigger or testing)
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<CheckReport, SchedulerError> {
        Ok(self.service.run_check(now).await?)
    }
}

/// Owns the background task; stop it to end the schedule
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to exit and wait for it.
    ///
    /// A pass already in flight finishes first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Check scheduler task failed");
        }
    }
}

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid check schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error(transparent)]
    Check(#[from] ServiceError),
}

// =========================================================================
// Tests
// =========================================================================
