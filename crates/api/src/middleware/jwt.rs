use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthUser, JwtService};
use crate::error::AppError;
use crate::state::AppState;

/// Validate an optional `Authorization` header and stash the caller in the
/// request extensions. Anonymous requests pass through untouched.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?,
        ),
        None => None,
    };

    if let Some(user) = authenticate_header(state.jwt_service(), header)? {
        request.extensions_mut().insert::<AuthUser>(user);
    }

    Ok(next.run(request).await)
}

/// Resolve an optional `Authorization` value to a caller.
///
/// `None` is anonymous. Anything present must be a valid bearer token.
pub fn authenticate_header(
    jwt_service: &JwtService,
    header: Option<&str>,
) -> Result<Option<AuthUser>, AppError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let token = bearer_token(header).ok_or_else(|| {
        AppError::Unauthorized("Expected 'Authorization: Bearer <token>'".to_string())
    })?;

    jwt_service
        .authenticate(token)
        .map(Some)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Token part of a `Bearer <token>` header value. The scheme is matched
/// case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token.trim()).filter(|t| !t.is_empty())
}
