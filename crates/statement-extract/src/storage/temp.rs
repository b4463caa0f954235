//! Temporary on-disk storage for uploaded documents
//!
//! Each request owns the files it persisted. `TempUpload` removes its file
//! exactly once: explicitly through `cleanup`, or on drop if the request
//! ended some other way.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::UploadedDocument;

const MAX_NAME_LEN: usize = 100;

/// Directory that receives uploads for the lifetime of one request each
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
    max_size: u64,
}

impl TempStore {
    /// Create a store rooted at `dir` that rejects files over `max_size` bytes
    pub fn new(dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            dir: dir.into(),
            max_size,
        }
    }

    /// Create the upload directory if it does not exist
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Upload directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream `body` to a fresh `{uuid}-{name}` file in the upload directory
    pub async fn persist<S, E>(
        &self,
        original_name: &str,
        media_type: &str,
        body: S,
    ) -> Result<TempUpload>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.dir.join(&stored_name);

        let mut file = tokio::fs::File::create(&path).await?;

        // From here on the guard owns the path, so early returns remove it.
        let mut upload = TempUpload {
            document: UploadedDocument {
                path,
                stored_name,
                original_name: original_name.to_string(),
                media_type: media_type.to_string(),
                size: 0,
            },
            cleaned: false,
        };

        futures_util::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| Error::validation(format!("Failed to read upload: {}", e)))?;

            upload.document.size += chunk.len() as u64;
            if upload.document.size > self.max_size {
                return Err(Error::validation(format!(
                    "File exceeds maximum size of {} bytes",
                    self.max_size
                )));
            }

            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::debug!(
            "Stored upload {} as {} ({} bytes)",
            original_name,
            upload.document.stored_name,
            upload.document.size
        );

        Ok(upload)
    }
}

/// A persisted upload owned by one request
#[derive(Debug)]
pub struct TempUpload {
    document: UploadedDocument,
    cleaned: bool,
}

impl TempUpload {
    /// Metadata of the stored file
    pub fn document(&self) -> &UploadedDocument {
        &self.document
    }

    /// Path of the stored file
    pub fn path(&self) -> &Path {
        &self.document.path
    }

    /// Delete the file if it still exists. Failures are logged only.
    pub async fn cleanup(mut self) {
        self.cleaned = true;
        match tokio::fs::remove_file(&self.document.path).await {
            Ok(()) => tracing::info!("Cleaned up temporary file: {}", self.document.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Temporary file already gone: {}", self.document.path.display())
            }
            Err(e) => {
                let cleanup = Error::Cleanup(format!("{}: {}", self.document.path.display(), e));
                tracing::warn!("{}", cleanup);
            }
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        match std::fs::remove_file(&self.document.path) {
            Ok(()) => tracing::debug!("Removed abandoned upload {}", self.document.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                let cleanup = Error::Cleanup(format!("{}: {}", self.document.path.display(), e));
                tracing::warn!("{}", cleanup);
            }
        }
    }
}

/// Reduce a client-supplied name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned
    }
}
