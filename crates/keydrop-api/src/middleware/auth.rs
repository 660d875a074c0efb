//! Bearer token check for the bridge-facing routes.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use keydrop_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects requests whose `Authorization` header does not carry the
/// configured API token. An empty configured token rejects everything.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.access.api_token.as_str();

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if !expected.is_empty() && token_matches(token, expected) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::authentication("Missing or invalid API token").into()),
    }
}

/// Compare without short-circuiting on the first differing byte.
fn token_matches(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches("secret", "secret"));
        assert!(!token_matches("secreT", "secret"));
        assert!(!token_matches("secret-longer", "secret"));
    }
}
