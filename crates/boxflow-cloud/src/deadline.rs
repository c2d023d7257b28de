//! Deadlines and status polling

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Absolute point in time after which remote work is abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// The total budget this deadline was created with
    pub fn budget(&self) -> Duration {
        self.budget
    }
}

/// Result of one status check while polling
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    /// Not terminal yet
    Pending,
    Done(T),
    /// Terminal but not the expected outcome; carries the observed state
    Failed(String),
}

/// Repeatedly run `check` every `interval` until it reports a terminal status.
///
/// `what` names the awaited condition and `resource` the remote object the
/// operator would have to clean up if polling gives up.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    resource: &str,
    interval: Duration,
    deadline: Deadline,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>>>,
{
    loop {
        match check().await? {
            PollStatus::Done(value) => return Ok(value),
            PollStatus::Failed(state) => {
                return Err(CloudError::UnexpectedState {
                    resource: resource.to_string(),
                    state,
                });
            }
            PollStatus::Pending => {}
        }

        if deadline.is_expired() {
            return Err(CloudError::Timeout {
                what: what.to_string(),
                resource: resource.to_string(),
                seconds: deadline.budget().as_secs(),
            });
        }

        tracing::debug!("Waiting for {}...", what);
        tokio::time::sleep(interval.min(deadline.remaining())).await;
    }
}
