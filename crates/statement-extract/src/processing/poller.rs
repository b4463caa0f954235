//! Readiness polling for uploaded files
//!
//! A freshly uploaded file starts in `PROCESSING`. The poller re-queries its
//! state at a fixed interval until it turns `ACTIVE` (success) or anything
//! else (failure). Optional attempt and wall-clock bounds turn an endless
//! wait into `Error::Timeout`.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PollingConfig;
use crate::error::{Error, Result};
use crate::providers::RemoteFileProvider;
use crate::types::{ReadinessState, RemoteFile};

/// A remote file that has been observed `ACTIVE`
///
/// Only the poller hands these out, so inference can never reference a
/// file that is still processing or has failed.
#[derive(Debug, Clone)]
pub struct ReadyFile(RemoteFile);

impl ReadyFile {
    /// The underlying remote handle
    pub fn remote(&self) -> &RemoteFile {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn assume_ready(mut file: RemoteFile) -> Self {
        file.state = ReadinessState::Active;
        Self(file)
    }
}

/// Bounds on how long to wait for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks
    pub interval: Duration,
    /// Maximum number of status checks per file
    pub max_attempts: Option<u32>,
    /// Maximum time spent waiting per file
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: None,
            max_wait: None,
        }
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
            max_wait: config.max_wait(),
        }
    }
}

/// Drives uploaded files from `PROCESSING` to `ACTIVE`
pub struct ReadinessPoller<'a> {
    provider: &'a dyn RemoteFileProvider,
    policy: PollPolicy,
}

impl<'a> ReadinessPoller<'a> {
    /// Create a poller over `provider`
    pub fn new(provider: &'a dyn RemoteFileProvider, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    /// Wait for every file to become active, one after another
    ///
    /// Fails on the first file that reaches a non-`ACTIVE` terminal state,
    /// exceeds a bound, or when `cancel` fires during an inter-poll delay.
    pub async fn wait_until_active(
        &self,
        files: &[RemoteFile],
        cancel: &CancellationToken,
    ) -> Result<Vec<ReadyFile>> {
        tracing::info!("Waiting for {} file(s) to finish processing...", files.len());

        let mut ready = Vec::with_capacity(files.len());
        for file in files {
            ready.push(self.wait_for(file, cancel).await?);
        }

        tracing::info!("All files ready");
        Ok(ready)
    }

    async fn wait_for(&self, file: &RemoteFile, cancel: &CancellationToken) -> Result<ReadyFile> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            let state = self.provider.get_status(file).await?;
            attempts += 1;

            match state {
                ReadinessState::Active => {
                    tracing::info!(
                        "File {} active after {} check(s) in {:.1}s",
                        file.name,
                        attempts,
                        started.elapsed().as_secs_f64()
                    );
                    let mut active = file.clone();
                    active.state = ReadinessState::Active;
                    return Ok(ReadyFile(active));
                }
                ReadinessState::Processing => {
                    tracing::debug!("File {} still processing (check {})", file.name, attempts);
                }
                other => {
                    tracing::error!("File {} failed to process (state: {})", file.name, other);
                    return Err(Error::ProcessingFailed {
                        name: file.name.clone(),
                        state: other.to_string(),
                    });
                }
            }

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(Error::timeout(format!(
                        "file {} still processing after {} status checks",
                        file.name, attempts
                    )));
                }
            }
            if let Some(max_wait) = self.policy.max_wait {
                if started.elapsed().saturating_add(self.policy.interval) > max_wait {
                    return Err(Error::timeout(format!(
                        "file {} still processing after {:.0}s (limit: {}s)",
                        file.name,
                        started.elapsed().as_secs_f64(),
                        max_wait.as_secs()
                    )));
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.policy.interval) => {}
            }
        }
    }
}
