//! API key guard for the admin routes.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::ServerConfig;

/// Admin authentication settings.
///
/// With no key configured the admin routes are open, which is the local
/// development mode.
#[derive(Clone, Debug, Default)]
pub struct AdminAuth {
    pub api_key: Option<String>,
}

impl AdminAuth {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            api_key: config.admin_key.clone(),
        }
    }

    /// No authentication (for local development/testing).
    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }
}

/// Rejects admin requests without the configured bearer key.
pub async fn admin_auth_middleware(
    State(auth): State<AdminAuth>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = &auth.api_key else {
        return Ok(next.run(request).await);
    };

    match bearer_token(request.headers()) {
        Some(token) if token == expected_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Invalid admin API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing or malformed Authorization header on admin route");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
