//! HTTP server for statement extraction

pub mod auth;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{ExtractConfig, ServerConfig};
use crate::error::{Error, Result};
use state::AppState;

/// Extraction HTTP server
pub struct ExtractServer {
    config: ExtractConfig,
    state: AppState,
}

impl ExtractServer {
    /// Create a server backed by the Gemini client from `config`
    pub async fn new(config: ExtractConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Start the server and run until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = build_router(self.state);

        tracing::info!("Starting extraction server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let server = &state.config().server;
    let cors = cors_layer(server);
    let api = routes::api_routes(state.clone(), server.max_upload_size);

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .with_state(state)
        // Applied bottom to top: CORS is outermost
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// CORS for the configured browser origins, with credentials
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining requests");
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::providers::RemoteFileProvider;
    use crate::testing::FakeProvider;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub(crate) const TEST_KEY: &str = "test-key";

    pub(crate) fn test_config(upload_dir: &Path) -> ExtractConfig {
        let mut config = ExtractConfig::default();
        config.auth.api_key = Secret::new(TEST_KEY);
        config.gemini.api_key = Secret::new("gemini-key");
        config.storage.upload_dir = upload_dir.to_path_buf();
        config
    }

    pub(crate) async fn test_router(upload_dir: &Path, provider: &Arc<FakeProvider>) -> Router {
        let provider: Arc<dyn RemoteFileProvider> = provider.clone();
        let state = AppState::with_provider(test_config(upload_dir), provider)
            .await
            .unwrap();
        build_router(state)
    }

    pub(crate) async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path(), &Arc::new(FakeProvider::new())).await;

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path(), &Arc::new(FakeProvider::new())).await;

        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No authentication token provided");

        let response = router
            .clone()
            .oneshot(
                Request::get("/")
                    .header(header::AUTHORIZATION, "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid authentication token");

        let response = router
            .oneshot(
                Request::get("/")
                    .header(header::AUTHORIZATION, format!("Bearer {}", TEST_KEY))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "API is running");
    }

    #[tokio::test]
    async fn test_bare_token_without_scheme_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path(), &Arc::new(FakeProvider::new())).await;

        let response = router
            .oneshot(
                Request::get("/")
                    .header(header::AUTHORIZATION, TEST_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path(), &Arc::new(FakeProvider::new())).await;

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/execute")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
