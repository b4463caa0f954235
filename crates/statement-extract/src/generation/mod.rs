//! Fixed extraction instruction and generation parameters

pub mod prompt;

pub use prompt::{GenerationParams, SYSTEM_INSTRUCTION, TRANSACTION_ANALYSIS_PROMPT};
