//! Gemini Files API + generateContent client
//!
//! Uploads documents with the resumable upload protocol, polls their state,
//! runs a single-turn extraction against the uploaded file and deletes it.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::path::Path;
use std::time::Duration;

use super::types::{
    Content, FileData, GeminiFile, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, StartUploadFile, StartUploadRequest, UploadResponse,
};
use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use crate::generation::{GenerationParams, SYSTEM_INSTRUCTION};
use crate::processing::ReadyFile;
use crate::providers::remote_file::RemoteFileProvider;
use crate::types::{ReadinessState, RemoteFile};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini client authenticated with an API key
pub struct GeminiFileClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    generation: GenerationParams,
}

impl GeminiFileClient {
    /// Create a new Gemini client from configuration
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose())
            .map_err(|e| Error::Config(format!("Invalid Gemini API key: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            generation: config.generation.clone(),
        })
    }

    /// Get the model being used
    pub fn model(&self) -> &str {
        &self.model
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    fn file_endpoint(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name)
    }

    fn generate_endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Turn a non-success response into an error built by `make_error`
    async fn check_status(
        response: reqwest::Response,
        context: &str,
        make_error: fn(String) -> Error,
    ) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(make_error(format!("{} failed ({}): {}", context, status, body)))
    }

    /// Start a resumable upload session and return the session URL
    async fn start_upload(
        &self,
        display_name: &str,
        mime_type: &str,
        len: usize,
    ) -> Result<String> {
        let response = self
            .http
            .post(self.upload_endpoint())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", len.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: StartUploadFile { display_name },
            })
            .send()
            .await
            .map_err(|e| Error::transport(format!("Gemini upload start request failed: {}", e)))?;

        let response = Self::check_status(response, "Gemini upload start", Error::Transport).await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::transport("Gemini upload start returned no upload URL"))
    }

    /// Fetch file metadata
    async fn get_file(&self, name: &str) -> Result<GeminiFile> {
        let response = self
            .http
            .get(self.file_endpoint(name))
            .send()
            .await
            .map_err(|e| Error::transport(format!("Gemini get file request failed: {}", e)))?;

        let response = Self::check_status(response, "Gemini get file", Error::Transport).await?;

        response
            .json()
            .await
            .map_err(|e| Error::transport(format!("Failed to parse Gemini file metadata: {}", e)))
    }
}

#[async_trait]
impl RemoteFileProvider for GeminiFileClient {
    async fn upload(&self, path: &Path, mime_type: &str, display_name: &str) -> Result<RemoteFile> {
        let data = tokio::fs::read(path).await?;

        let upload_url = self.start_upload(display_name, mime_type, data.len()).await?;

        let response = self
            .http
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(CONTENT_TYPE, mime_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Gemini upload request failed: {}", e)))?;

        let response = Self::check_status(response, "Gemini upload", Error::Transport).await?;

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| {
                Error::transport(format!("Failed to parse Gemini upload response: {}", e))
            })?;

        let file = uploaded.file.into_remote(mime_type);
        tracing::info!("Uploaded file {} as: {}", file.label(), file.name);
        Ok(file)
    }

    async fn get_status(&self, file: &RemoteFile) -> Result<ReadinessState> {
        let current = self.get_file(&file.name).await?;

        if let Some(message) = current.error.and_then(|e| e.message) {
            tracing::warn!("Gemini reports error for {}: {}", file.name, message);
        }

        Ok(current.state)
    }

    async fn converse(&self, file: &ReadyFile, instruction: &str) -> Result<String> {
        let remote = file.remote();

        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![
                Content {
                    role: Some("user"),
                    parts: vec![Part::FileData {
                        file_data: FileData {
                            mime_type: &remote.mime_type,
                            file_uri: &remote.uri,
                        },
                    }],
                },
                Content {
                    role: Some("user"),
                    parts: vec![Part::Text { text: instruction }],
                },
            ],
            generation_config: GenerationConfig::from(&self.generation),
        };

        let response = self
            .http
            .post(self.generate_endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::inference(format!("Gemini request failed: {}", e)))?;

        let response = Self::check_status(response, "Gemini generation", Error::Inference).await?;

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::inference(format!("Failed to parse Gemini response: {}", e)))?;

        generated.into_text().map_err(Error::Inference)
    }

    async fn delete(&self, file: &RemoteFile) -> Result<()> {
        let response = self
            .http
            .delete(self.file_endpoint(&file.name))
            .send()
            .await
            .map_err(|e| Error::transport(format!("Gemini delete request failed: {}", e)))?;

        Self::check_status(response, "Gemini delete", Error::Transport).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
