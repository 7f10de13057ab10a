//! Identity extraction.
//!
//! Authentication itself is delegated to an upstream OAuth proxy; by the
//! time a request reaches this server the proxy has validated the login and
//! attached the three identity fields this system consumes. The extractor
//! only reads them back out.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};

use packmate_core::UserIdentity;

/// Header carrying the identity provider's stable subject id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The authenticated caller, read from trusted proxy headers.
///
/// Rejects with 401 when the subject id header is absent; email and display
/// name are optional.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserIdentity);

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let id = header_string(headers, USER_ID_HEADER)
            .ok_or((StatusCode::UNAUTHORIZED, "missing identity"))?;

        Ok(AuthUser(UserIdentity {
            id,
            email: header_string(headers, USER_EMAIL_HEADER),
            name: header_string(headers, USER_NAME_HEADER),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_string_trims_and_drops_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  sub-1  "));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static(""));

        assert_eq!(header_string(&headers, USER_ID_HEADER).as_deref(), Some("sub-1"));
        assert_eq!(header_string(&headers, USER_EMAIL_HEADER), None);
        assert_eq!(header_string(&headers, USER_NAME_HEADER), None);
    }
}
