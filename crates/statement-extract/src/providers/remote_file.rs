//! Remote file provider trait for the inference backend

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::processing::ReadyFile;
use crate::types::{ReadinessState, RemoteFile};

/// Capability wrapper around a document-understanding backend
///
/// Implementations:
/// - `GeminiFileClient`: Gemini Files API + generateContent
#[async_trait]
pub trait RemoteFileProvider: Send + Sync {
    /// Upload a local file
    ///
    /// Fails with `Error::Transport` on network or auth failure.
    async fn upload(&self, path: &Path, mime_type: &str, display_name: &str) -> Result<RemoteFile>;

    /// Query the current readiness state of an uploaded file
    ///
    /// Fails with `Error::Transport` if the file is unknown or the call fails.
    async fn get_status(&self, file: &RemoteFile) -> Result<ReadinessState>;

    /// Single-turn exchange with the file as prior context and `instruction` as the user turn
    ///
    /// Fails with `Error::Inference` on any backend-side failure.
    async fn converse(&self, file: &ReadyFile, instruction: &str) -> Result<String>;

    /// Delete an uploaded file
    ///
    /// Callers treat failures as best-effort and only log them.
    async fn delete(&self, file: &RemoteFile) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
