//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Validates the bearer token and stores its claims in the request
/// extensions for the handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!("Missing or invalid Authorization header");
            ApiError::Unauthorized
        })?;

    let claims = crate::auth::validate_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = %e, "Token validation failed");
        ApiError::Unauthorized
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every authenticated API request with its caller and outcome.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();
    let response = next.run(request).await;
    let duration = Utc::now() - start;

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        status = response.status().as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
