//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway forwards the verified
//! subject as request headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::CallerIdentity;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role assumed when the gateway sends none.
pub const DEFAULT_ROLE: &str = "customer";

/// Extracts the [`CallerIdentity`] of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub CallerIdentity);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (Some(subject_id), Some(display_name)) = (
            header(parts, USER_ID_HEADER),
            header(parts, USER_NAME_HEADER),
        ) else {
            tracing::warn!(uri = %parts.uri, "request without caller identity");
            return Err(ApiError::Unauthorized(
                "Missing caller identity".to_string(),
            ));
        };
        let role = header(parts, USER_ROLE_HEADER).unwrap_or(DEFAULT_ROLE);

        Ok(AuthenticatedCaller(CallerIdentity::new(
            subject_id,
            display_name,
            role,
        )))
    }
}
