//! Bearer-token authentication middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Reject requests whose `Authorization` token does not match the configured key
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(Error::MissingCredentials)?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.split_whitespace().nth(1))
        .unwrap_or_default();

    let expected = &state.config().auth.api_key;
    if expected.is_empty() || !constant_time_eq(token.as_bytes(), expected.expose().as_bytes()) {
        tracing::warn!("Rejected request to {} with invalid token", request.uri().path());
        return Err(Error::InvalidCredentials);
    }

    Ok(next.run(request).await)
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
