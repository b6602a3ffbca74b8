use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, info};

use crate::auth::password::verify_password;
use crate::auth::principal::{Principal, decode_basic};
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::repo;

/// Whether a request may be served without credentials
///
/// Registration and the health probe are the only endpoints open to
/// anonymous callers; everything else requires Basic credentials.
fn is_public(method: &Method, path: &str) -> bool {
    (method == Method::GET && path == "/health")
        || (method == Method::POST && path == "/api/v1/user")
}

/// Middleware that resolves Basic credentials to a user account
///
/// Public endpoints pass through untouched. For everything else the
/// `Authorization` header is decoded, the account is loaded and the
/// password checked; blocked accounts are rejected even with the right
/// password. On success a [`Principal`] is stored in the request
/// extensions for handlers, and copied into the response extensions so
/// the audit middleware can attribute the request.
pub async fn authenticate(
    State(pool): State<Arc<DbPool>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_public(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    let (username, password) = decode_basic(header_value)
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".to_string()))?;

    let user = repo::get_user_by_username(&pool, &username)
        .map_err(ApiError::Database)?
        .ok_or_else(|| {
            debug!("Unknown username in credentials");
            ApiError::Unauthorized("Invalid credentials".to_string())
        })?;

    if user.is_blocked() {
        debug!("Blocked account attempted to authenticate");
        return Err(ApiError::Unauthorized("Account is blocked".to_string()));
    }

    if !verify_password(&password, &user.get_password_hash()).map_err(ApiError::Database)? {
        debug!("Password mismatch for username");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let principal = Principal::from(&user);
    request.extensions_mut().insert(principal.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    Ok(response)
}

/// Middleware that writes one audit line per request
///
/// Sits outside the authentication layer so it also records rejected
/// requests. Failed requests (status above 399) are logged at error
/// level, everything else at info.
pub async fn audit_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let username = response
        .extensions()
        .get::<Principal>()
        .map(|principal| principal.username.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    if status > 399 {
        error!(
            method = %method,
            uri = %uri,
            status,
            duration_ms,
            username = %username,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status,
            duration_ms,
            username = %username,
            "Request handled"
        );
    }

    response
}
