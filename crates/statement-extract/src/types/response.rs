//! Response envelopes for the HTTP surface

use serde::{Deserialize, Serialize};

use super::document::UploadedDocument;

/// Success envelope for `POST /execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Human-readable status message
    pub message: String,
    /// Action label echoed from the request
    pub action: String,
    /// Metadata of the uploaded file
    pub file: FileInfo,
    /// Raw text returned by the inference backend
    #[serde(rename = "responseJson")]
    pub response_json: String,
}

impl ExecuteResponse {
    /// Build the success envelope for a processed upload
    pub fn processed(action: String, document: &UploadedDocument, response_json: String) -> Self {
        Self {
            message: "File processed successfully".to_string(),
            action,
            file: FileInfo::from(document),
            response_json,
        }
    }
}

/// File metadata echoed back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Name supplied by the client
    pub originalname: String,
    /// Size in bytes
    pub size: u64,
    /// Path the file was stored at
    pub path: String,
    /// Name the file was stored under
    pub filename: String,
}

impl From<&UploadedDocument> for FileInfo {
    fn from(doc: &UploadedDocument) -> Self {
        Self {
            originalname: doc.original_name.clone(),
            size: doc.size,
            path: doc.display_path(),
            filename: doc.stored_name.clone(),
        }
    }
}

/// Error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error summary
    pub error: String,
    /// Stable error category
    pub code: String,
    /// Detail text for server-side failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
