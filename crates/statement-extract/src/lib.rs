//! statement-extract: Transaction extraction from PDF statements
//!
//! This crate exposes a small HTTP service that accepts an uploaded PDF,
//! hands it to a remote multimodal model through the Gemini Files API and
//! returns the model's JSON transaction table. Both the local upload and the
//! remote file are removed before each request completes.

pub mod config;
pub mod error;
pub mod generation;
pub mod processing;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::ExtractConfig;
pub use error::{Error, Result};
pub use processing::{ExtractionResult, Extractor, PollPolicy};
pub use providers::{GeminiFileClient, RemoteFileProvider};
pub use server::ExtractServer;
pub use types::{ExecuteResponse, ReadinessState, RemoteFile, UploadedDocument};
