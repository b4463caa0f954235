//! Provider abstraction for the remote inference backend
//!
//! The pipeline only talks to `RemoteFileProvider`; the Gemini client is
//! constructed once at startup and injected.

pub mod gemini;
pub mod remote_file;

pub use gemini::GeminiFileClient;
pub use remote_file::RemoteFileProvider;
