//! Caller identity, as asserted by the upstream auth gateway.
//!
//! The gateway authenticates the user and forwards their id in the
//! `x-user-id` header. No header means an anonymous caller; a header that
//! is not a UUID is rejected rather than silently downgraded.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caller(pub Option<Uuid>);

impl Caller {
    pub fn anonymous() -> Self {
        Caller(None)
    }

    pub fn user(id: Uuid) -> Self {
        Caller(Some(id))
    }

    pub fn id(&self) -> Option<&Uuid> {
        self.0.as_ref()
    }

    /// Reads the identity header.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let Some(value) = headers.get(USER_ID_HEADER) else {
            return Ok(Caller::anonymous());
        };

        let raw = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid x-user-id header"))?
            .trim();

        if raw.is_empty() {
            return Ok(Caller::anonymous());
        }

        Uuid::parse_str(raw)
            .map(Caller::user)
            .map_err(|_| ApiError::unauthorized("Invalid x-user-id header"))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_missing_header_is_anonymous() {
        assert_eq!(
            Caller::from_headers(&HeaderMap::new()).unwrap(),
            Caller::anonymous()
        );
    }

    #[test]
    fn test_valid_uuid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_static("550e8400-e29b-41d4-a716-446655440000"),
        );

        let caller = Caller::from_headers(&headers).unwrap();
        assert_eq!(
            caller.id().map(|id| id.to_string()).as_deref(),
            Some("550e8400-e29b-41d4-a716-446655440000")
        );
    }

    #[test]
    fn test_blank_header_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(Caller::from_headers(&headers).unwrap(), Caller::anonymous());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("admin"));
        let err = Caller::from_headers(&headers).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);
    }
}
