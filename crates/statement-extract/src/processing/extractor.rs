//! Extraction pipeline: upload, wait until ready, converse, release
//!
//! Every remote file created by an upload is deleted exactly once before
//! `extract` returns, whatever happened in between. Release failures are
//! logged and never replace the pipeline outcome.

use futures_util::future::join_all;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::poller::{PollPolicy, ReadinessPoller};
use crate::config::PollingConfig;
use crate::error::{Error, Result};
use crate::generation::TRANSACTION_ANALYSIS_PROMPT;
use crate::providers::RemoteFileProvider;
use crate::types::{RemoteFile, PDF_MIME_TYPE};

/// Text returned by the backend for one document
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Raw model output (JSON text in the default configuration)
    pub text: String,
    /// Remote name the document was processed under
    pub remote_name: String,
    /// Wall time spent in the pipeline
    pub elapsed: Duration,
}

/// Orchestrates one document through the remote backend
pub struct Extractor {
    provider: Arc<dyn RemoteFileProvider>,
    policy: PollPolicy,
    deadline: Option<Duration>,
}

impl Extractor {
    /// Create an extractor with an explicit poll policy and no deadline
    pub fn new(provider: Arc<dyn RemoteFileProvider>, policy: PollPolicy) -> Self {
        Self {
            provider,
            policy,
            deadline: None,
        }
    }

    /// Create an extractor from polling configuration
    pub fn from_config(provider: Arc<dyn RemoteFileProvider>, config: &PollingConfig) -> Self {
        Self::new(provider, PollPolicy::from(config)).with_deadline(config.request_deadline())
    }

    /// Bound polling plus inference by `deadline`
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run the full pipeline for the PDF at `path`
    ///
    /// The upload itself is never interrupted, so a created remote file is
    /// always known and released. `cancel` stops polling and inference early.
    pub async fn extract(
        &self,
        path: &Path,
        display_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult> {
        let started = Instant::now();

        let uploaded = match self.provider.upload(path, PDF_MIME_TYPE, display_name).await {
            Ok(file) => vec![file],
            Err(e) => {
                tracing::error!("Error uploading {}: {}", display_name, e);
                return Err(e);
            }
        };

        let outcome = self.process(&uploaded, cancel).await;

        self.release(&uploaded).await;

        match outcome {
            Ok(text) => {
                let elapsed = started.elapsed();
                tracing::info!(
                    "Extracted {} chars from {} via {} in {:.1}s",
                    text.len(),
                    display_name,
                    self.provider.name(),
                    elapsed.as_secs_f64()
                );
                Ok(ExtractionResult {
                    text,
                    remote_name: uploaded[0].name.clone(),
                    elapsed,
                })
            }
            Err(e) => {
                tracing::error!("Error processing {}: {}", display_name, e);
                Err(e)
            }
        }
    }

    /// Wait for readiness then converse, under the optional deadline
    async fn process(&self, files: &[RemoteFile], cancel: &CancellationToken) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let work = async {
            let poller = ReadinessPoller::new(self.provider.as_ref(), self.policy);
            let ready = poller.wait_until_active(files, cancel).await?;
            let file = ready
                .first()
                .ok_or_else(|| Error::internal("no uploaded file to converse with"))?;

            tokio::select! {
                _ = cancel.cancelled() => Err(Error::Cancelled),
                reply = self.provider.converse(file, TRANSACTION_ANALYSIS_PROMPT) => reply,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, work).await.map_err(|_| {
                Error::timeout(format!(
                    "extraction exceeded deadline of {}s",
                    deadline.as_secs()
                ))
            })?,
            None => work.await,
        }
    }

    /// Delete every uploaded file concurrently, logging failures
    async fn release(&self, files: &[RemoteFile]) {
        tracing::info!("Cleaning up {} uploaded file(s)...", files.len());

        let results = join_all(files.iter().map(|file| async move {
            (file, self.provider.delete(file).await)
        }))
        .await;

        for (file, result) in results {
            match result {
                Ok(()) => tracing::info!("Deleted file: {}", file.label()),
                Err(e) => {
                    let cleanup = Error::Cleanup(format!("{}: {}", file.name, e));
                    tracing::warn!("{}", cleanup);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use crate::types::ReadinessState;
    use tempfile::NamedTempFile;
    use tracing_test::traced_test;

    fn pdf() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"%PDF-1.4\n").unwrap();
        file
    }

    fn extractor(provider: &Arc<FakeProvider>) -> Extractor {
        let provider: Arc<dyn RemoteFileProvider> = provider.clone();
        Extractor::new(provider, PollPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_one_processing_poll() {
        let provider = Arc::new(
            FakeProvider::new()
                .with_statuses(&[ReadinessState::Processing, ReadinessState::Active])
                .with_reply(r#"[{"Transaction Type":"Card","Amount":-42.1}]"#),
        );
        let file = pdf();

        let result = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.text, r#"[{"Transaction Type":"Card","Amount":-42.1}]"#);
        assert_eq!(result.remote_name, "files/test-1");

        let calls = provider.calls();
        assert_eq!(calls.upload, 1);
        assert_eq!(calls.status, 2);
        assert_eq!(calls.converse, 1);
        assert_eq!(calls.delete, 1);
        assert_eq!(calls.deleted, vec!["files/test-1".to_string()]);
        assert_eq!(calls.status_at_converse, vec![Some(ReadinessState::Active)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_processing_still_deletes() {
        let provider = Arc::new(FakeProvider::new().with_statuses(&[ReadinessState::Failed]));
        let file = pdf();

        let err = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ProcessingFailed { .. }));
        let calls = provider.calls();
        assert_eq!(calls.converse, 0);
        assert_eq!(calls.delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inference_failure_deletes_once() {
        let provider = Arc::new(FakeProvider::new().failing_converse());
        let file = pdf();

        let err = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Inference(_)));
        let calls = provider.calls();
        assert_eq!(calls.converse, 1);
        assert_eq!(calls.delete, 1);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_upload_failure_has_nothing_to_release() {
        let provider = Arc::new(FakeProvider::new().failing_upload());
        let file = pdf();

        let err = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(logs_contain("Error uploading june.pdf"));
        let calls = provider.calls();
        assert_eq!(calls.status, 0);
        assert_eq!(calls.converse, 0);
        assert_eq!(calls.delete, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_still_deletes() {
        let provider = Arc::new(FakeProvider::new().failing_status());
        let file = pdf();

        let err = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(provider.calls().delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failure_does_not_mask_success() {
        let provider = Arc::new(FakeProvider::new().with_reply("{}").failing_delete());
        let file = pdf();

        let result = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.text, "{}");
        assert_eq!(provider.calls().delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failure_does_not_replace_error() {
        let provider = Arc::new(FakeProvider::new().failing_converse().failing_delete());
        let file = pdf();

        let err = extractor(&provider)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Inference(_)));
        assert_eq!(provider.calls().delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_times_out_and_deletes() {
        let provider = Arc::new(FakeProvider::new().with_statuses(&[ReadinessState::Processing]));
        let file = pdf();

        let err = extractor(&provider)
            .with_deadline(Some(Duration::from_secs(25)))
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        let calls = provider.calls();
        assert_eq!(calls.status, 3);
        assert_eq!(calls.converse, 0);
        assert_eq!(calls.delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_bound_from_config() {
        let provider = Arc::new(FakeProvider::new().with_statuses(&[ReadinessState::Processing]));
        let file = pdf();
        let config = PollingConfig {
            interval_secs: 1,
            max_attempts: Some(5),
            ..PollingConfig::default()
        };

        let dyn_provider: Arc<dyn RemoteFileProvider> = provider.clone();
        let err = Extractor::from_config(dyn_provider, &config)
            .extract(file.path(), "june.pdf", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        let calls = provider.calls();
        assert_eq!(calls.status, 5);
        assert_eq!(calls.delete, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_polling_still_deletes() {
        let provider = Arc::new(FakeProvider::new());
        let file = pdf();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = extractor(&provider)
            .extract(file.path(), "june.pdf", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        let calls = provider.calls();
        assert_eq!(calls.upload, 1);
        assert_eq!(calls.converse, 0);
        assert_eq!(calls.delete, 1);
    }
}
