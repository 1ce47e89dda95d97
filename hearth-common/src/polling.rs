//! Fixed-interval polling of asynchronous generation jobs
//!
//! A job is polled every `interval` until it completes, fails, or
//! `max_attempts` fetches have been made. Fetch errors end the wait
//! immediately; there is no backoff, cancellation or resumption.

use crate::api::types::{JobState, JobStatus};
use crate::config::PollingConfig;
use crate::time::millis_to_duration;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Anything that reports the current state of a job
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(&self, operation_id: &str) -> Result<JobState>;
}

/// Poll loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPoller {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl JobPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(millis_to_duration(config.interval_ms), config.max_attempts)
    }

    /// Wait for `operation_id` to finish and return its result.
    ///
    /// A completed job without a result yields `Value::Null`.
    pub async fn wait<S>(&self, source: &S, operation_id: &str) -> Result<Value>
    where
        S: JobSource + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let state = source.fetch(operation_id).await?;
            debug!(
                operation_id = %operation_id,
                attempt,
                max_attempts = self.max_attempts,
                status = ?state.status,
                "Polled job"
            );

            if !state.status.is_finished() {
                if attempt < self.max_attempts {
                    tokio::time::sleep(self.interval).await;
                }
                continue;
            }

            if state.status == JobStatus::Failed {
                return Err(Error::JobFailed(
                    state
                        .error
                        .unwrap_or_else(|| format!("operation {} failed", operation_id)),
                ));
            }

            info!(operation_id = %operation_id, attempts = attempt, "Job completed");
            return Ok(state.result.unwrap_or(Value::Null));
        }

        Err(Error::PollTimeout {
            attempts: self.max_attempts,
        })
    }
}
