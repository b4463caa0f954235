//! Locally persisted upload types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media type accepted by the extraction pipeline
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Whether a declared media type is PDF, ignoring case
pub fn is_pdf(media_type: &str) -> bool {
    media_type.trim().eq_ignore_ascii_case(PDF_MIME_TYPE)
}

/// A document accepted into the pipeline and written to the local upload store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedDocument {
    /// Absolute path of the stored file
    pub path: PathBuf,
    /// Name of the stored file inside the upload directory
    pub stored_name: String,
    /// Name supplied by the client
    pub original_name: String,
    /// Declared media type
    pub media_type: String,
    /// Size in bytes
    pub size: u64,
}

impl UploadedDocument {
    /// Stored path rendered for responses and logs
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
