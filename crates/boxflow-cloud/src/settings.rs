//! Orchestration timing settings

use crate::deadline::Deadline;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Delay between status checks of asynchronous operations
    pub poll_interval: Duration,
    /// Ceiling for each polled operation
    pub poll_timeout: Duration,
    pub connect_attempts: u32,
    pub connect_retry_delay: Duration,
    /// Optional ceiling for a single image pull
    pub pull_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            poll_timeout: Duration::from_secs(600),
            connect_attempts: 10,
            connect_retry_delay: Duration::from_secs(10),
            pull_timeout: None,
        }
    }
}

impl Settings {
    /// Fresh deadline for one operation
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.poll_timeout)
    }
}
