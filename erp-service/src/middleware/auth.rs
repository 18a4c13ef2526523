//! Session token validation.
//!
//! Token issuance belongs to the external authentication flow; this
//! middleware only validates the bearer token and builds the per-request
//! identity context that every handler receives.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use erp_core::authz::Role;
use erp_core::context::RequestContext;
use erp_core::error::AppError;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub locale: Option<String>,
    pub exp: usize,
}

/// Validate the bearer token and attach a `RequestContext` to the request.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("missing bearer token")))?;

    let claims = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthorized(anyhow::anyhow!("invalid session token: {}", e)))?
    .claims;

    let role: Role = claims
        .role
        .parse()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("unknown role in token")))?;

    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let ctx = RequestContext {
        user_id: claims.sub,
        username: claims.username,
        role,
        locale: claims.locale.unwrap_or_else(|| "en".to_string()),
        ip,
        user_agent,
    };

    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}
