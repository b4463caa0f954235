//! Gemini REST request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::GenerationParams;
use crate::types::{ReadinessState, RemoteFile};

// ============================================================================
// Files API
// ============================================================================

#[derive(Serialize)]
pub(super) struct StartUploadRequest<'a> {
    pub file: StartUploadFile<'a>,
}

#[derive(Serialize)]
pub(super) struct StartUploadFile<'a> {
    #[serde(rename = "displayName")]
    pub display_name: &'a str,
}

#[derive(Deserialize)]
pub(super) struct UploadResponse {
    pub file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeminiFile {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// int64 values are encoded as strings
    #[serde(default)]
    pub size_bytes: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub state: ReadinessState,
    #[serde(default)]
    pub error: Option<FileError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileError {
    #[serde(default)]
    pub message: Option<String>,
}

impl GeminiFile {
    pub fn into_remote(self, fallback_mime_type: &str) -> RemoteFile {
        RemoteFile {
            uri: self.uri.unwrap_or_default(),
            mime_type: self
                .mime_type
                .unwrap_or_else(|| fallback_mime_type.to_string()),
            display_name: self.display_name,
            size_bytes: self.size_bytes.and_then(|s| s.parse().ok()),
            create_time: self.create_time,
            state: self.state,
            name: self.name,
        }
    }
}

// ============================================================================
// generateContent
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequest<'a> {
    pub system_instruction: Content<'a>,
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
pub(super) struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub(super) enum Part<'a> {
    Text {
        text: &'a str,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FileData<'a> {
    pub mime_type: &'a str,
    pub file_uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfig<'a> {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<&'a str>,
}

impl<'a> From<&'a GenerationParams> for GenerationConfig<'a> {
    fn from(params: &'a GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_output_tokens: params.max_output_tokens,
            response_mime_type: params.response_mime_type.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, or why there is none
    pub fn into_text(self) -> std::result::Result<String, String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(format!("Prompt blocked by backend: {}", reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| "No candidates in Gemini response".to_string())?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(match candidate.finish_reason {
                Some(reason) => format!("No text in Gemini response (finish reason: {})", reason),
                None => "No text in Gemini response".to_string(),
            });
        }

        Ok(text)
    }
}
