//! Core types for the extraction service

pub mod document;
pub mod remote;
pub mod response;

pub use document::{is_pdf, UploadedDocument, PDF_MIME_TYPE};
pub use remote::{ReadinessState, RemoteFile};
pub use response::{ErrorBody, ExecuteResponse, FileInfo};
