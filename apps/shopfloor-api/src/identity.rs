//! # Caller Identity
//!
//! Authentication happens upstream. The gateway in front of this service
//! forwards the authenticated user as trusted headers:
//!
//! | Header          | Required | Meaning                              |
//! |-----------------|----------|--------------------------------------|
//! | `x-user-id`     | yes      | the acting user (seller of a sale)   |
//! | `x-business-id` | no       | the user's business, when they have one |
//!
//! A missing or malformed `x-user-id` is rejected with 401. POS handlers
//! call [`Identity::business_id`], which turns a missing business into
//! 400 "User has no business".

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const BUSINESS_ID_HEADER: &str = "x-business-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub business_id: Option<i64>,
}

impl Identity {
    /// The caller's business, required by every POS operation.
    pub fn business_id(&self) -> Result<i64, ApiError> {
        self.business_id
            .ok_or_else(|| ApiError::validation("User has no business"))
    }

    fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_id = header_id(headers, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        Ok(Identity {
            user_id,
            business_id: header_id(headers, BUSINESS_ID_HEADER),
        })
    }
}

/// Positive integer header value; anything else reads as absent.
fn header_id(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_user_and_business() {
        let id = Identity::from_headers(&headers(&[("x-user-id", "4"), ("x-business-id", "2")]))
            .unwrap();
        assert_eq!(id, Identity { user_id: 4, business_id: Some(2) });
        assert_eq!(id.business_id().unwrap(), 2);
    }

    #[test]
    fn test_missing_user_is_unauthorized() {
        let err = Identity::from_headers(&headers(&[("x-business-id", "2")])).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = Identity::from_headers(&headers(&[("x-user-id", "abc")])).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_missing_business_is_rejected_on_use() {
        let id = Identity::from_headers(&headers(&[("x-user-id", "4")])).unwrap();
        let err = id.business_id().unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "User has no business");
    }

    #[test]
    fn test_non_positive_business_reads_as_absent() {
        let id = Identity::from_headers(&headers(&[("x-user-id", "4"), ("x-business-id", "0")]))
            .unwrap();
        assert!(id.business_id.is_none());
    }
}
