use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::cores::errors::RelayError;
use crate::cores::predictions::client::PredictionApi;
use crate::cores::schemas::{JobStatus, Prediction};

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            backoff_factor: 1.5,
            max_attempts: 120,
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    pub fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_factor).min(self.max_interval)
    }
}

// Re-reads a prediction until it is terminal; cancels it upstream when giving up early.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    policy: PollPolicy,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Poller { policy }
    }

    pub async fn wait_for_terminal(
        &self,
        api: &dyn PredictionApi,
        mut prediction: Prediction,
        cancel: &CancellationToken,
    ) -> Result<Prediction, RelayError> {
        let started = Instant::now();
        let mut interval = self.policy.initial_interval;
        let mut attempts: u32 = 0;

        while !prediction.status.is_terminal() {
            let elapsed = started.elapsed();
            if attempts >= self.policy.max_attempts || elapsed >= self.policy.timeout {
                self.abandon(api, &prediction.id).await;
                return Err(RelayError::Timeout { attempts, elapsed });
            }

            let delay = interval.min(self.policy.timeout.saturating_sub(elapsed));
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.abandon(api, &prediction.id).await;
                    return Err(RelayError::Cancelled);
                }
                _ = sleep(delay) => {}
            }

            attempts += 1;
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.abandon(api, &prediction.id).await;
                    return Err(RelayError::Cancelled);
                }
                polled = api.get(&prediction.id) => polled,
            };
            let polled = match polled {
                Ok(polled) => polled,
                Err(err) => {
                    self.abandon(api, &prediction.id).await;
                    return Err(err);
                }
            };
            if polled.status != prediction.status {
                debug!("prediction {} moved {:?} -> {:?}", polled.id, prediction.status, polled.status);
            }
            prediction = polled;
            interval = self.policy.next_interval(interval);
        }

        match prediction.status {
            JobStatus::Succeeded => {
                info!("prediction {} succeeded after {} status checks", prediction.id, attempts);
                Ok(prediction)
            }
            _ => Err(RelayError::JobFailed(prediction.error_text())),
        }
    }

    // Best effort; the caller already has an error to report.
    async fn abandon(&self, api: &dyn PredictionApi, id: &str) {
        if let Err(err) = api.cancel(id).await {
            warn!("failed to cancel prediction {}: {}", id, err);
        }
    }
}
