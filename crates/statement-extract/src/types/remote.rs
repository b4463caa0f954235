//! Remote file handle and readiness state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-reported processing state of an uploaded file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadinessState {
    /// Still being processed, not yet usable
    #[default]
    Processing,
    /// Ready to be referenced in inference calls
    Active,
    /// Processing failed on the backend
    Failed,
    /// Anything the backend reports that we do not recognise
    #[serde(other)]
    StateUnspecified,
}

impl ReadinessState {
    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Active => "ACTIVE",
            Self::Failed => "FAILED",
            Self::StateUnspecified => "STATE_UNSPECIFIED",
        }
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a document held by the inference backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFile {
    /// Opaque resource name, e.g. `files/abc123`
    pub name: String,
    /// URI used to reference the file in inference calls
    pub uri: String,
    /// Declared media type
    pub mime_type: String,
    /// Human-readable name given at upload time
    #[serde(default)]
    pub display_name: Option<String>,
    /// Size reported by the backend
    #[serde(default)]
    pub size_bytes: Option<u64>,
    /// Creation time reported by the backend
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    /// Last observed readiness state
    #[serde(default)]
    pub state: ReadinessState,
}

impl RemoteFile {
    /// Name used in log lines (display name when known)
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}
