//! Gemini backend

mod client;
mod types;

pub use client::GeminiFileClient;
