//! Local storage for uploads that live only as long as their request

pub mod temp;

pub use temp::{sanitize_file_name, TempStore, TempUpload};
