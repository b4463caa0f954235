//! Prompt text and sampling parameters for transaction extraction

use serde::{Deserialize, Serialize};

/// System instruction given to the model for every extraction
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful precise document reader able to read tabular data and intepret the records.";

/// User-turn instruction sent after the document is placed in context
///
/// Deployed wording, kept verbatim including its typos.
pub const TRANSACTION_ANALYSIS_PROMPT: &str = r#"Read the document.
It is likely a type of bank or credit card statement where transactions are detailed.
Locate all low level transaction records within this document.
If a transaction has data additional information for instance like location and original currency code, then consider them as part of 'Transaction Details'.
If a transaction is marked as 'CR' or 'CREDIT OR DIRECT DEBIT' OR 'DIRECT DEBIT TRANSACTION' or similar, then negate the transaction amount.
List all the resulting records as tabular entries.
If you determine that multiple tables will be produced, combined them all into a single table and add a new column named 'Transaction Type' at the start to differentiate the transaction type records."#;

/// Sampling parameters sent with the extraction call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Sampling randomness
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Top-k truncation
    pub top_k: u32,
    /// Hard cap on response length
    pub max_output_tokens: u32,
    /// Requested response media type (JSON mode)
    pub response_mime_type: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: Some("application/json".to_string()),
        }
    }
}
