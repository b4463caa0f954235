//! Application state for the extraction server

use std::sync::Arc;

use crate::config::ExtractConfig;
use crate::error::Result;
use crate::processing::Extractor;
use crate::providers::{GeminiFileClient, RemoteFileProvider};
use crate::storage::TempStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ExtractConfig,
    /// Pipeline shared by all requests
    extractor: Arc<Extractor>,
    /// Local upload directory
    temp_store: TempStore,
}

impl AppState {
    /// Create state backed by the Gemini client described in `config`
    pub async fn new(config: ExtractConfig) -> Result<Self> {
        let client = GeminiFileClient::new(&config.gemini)?;
        tracing::info!("Gemini client initialized (model: {})", client.model());
        Self::with_provider(config, Arc::new(client)).await
    }

    /// Create state around an already constructed provider
    pub async fn with_provider(
        config: ExtractConfig,
        provider: Arc<dyn RemoteFileProvider>,
    ) -> Result<Self> {
        let extractor = Arc::new(Extractor::from_config(provider, &config.polling));

        let temp_store = TempStore::new(
            config.storage.upload_dir.clone(),
            config.server.max_upload_size as u64,
        );
        temp_store.ensure_dir().await?;
        tracing::info!("Upload directory: {}", temp_store.dir().display());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                extractor,
                temp_store,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &ExtractConfig {
        &self.inner.config
    }

    /// Get the extraction pipeline
    pub fn extractor(&self) -> &Arc<Extractor> {
        &self.inner.extractor
    }

    /// Get the upload store
    pub fn temp_store(&self) -> &TempStore {
        &self.inner.temp_store
    }
}
