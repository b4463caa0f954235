//! Extraction pipeline with readiness polling

mod extractor;
mod poller;

pub use extractor::{ExtractionResult, Extractor};
pub use poller::{PollPolicy, ReadinessPoller, ReadyFile};
