//! Authentication extractors.
//!
//! The bearer credential is verified (signature + expiry) and decoded into an
//! explicit [`CurrentUser`] value handed to the handler — identity is never
//! smuggled through a mutated request object. Role gating on top of the
//! verified identity is the separate check in [`crate::authz`]; the
//! `RequireAdmin`/`RequireSuperAdmin` extractors below compose the two for
//! routes whose requirement is fixed.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use tradepost_core::{Role, RoleSet, UserId};

use crate::authz::require_any_role;
use crate::error::AppError;
use crate::state::AppState;

/// The verified identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub roles: RoleSet,
}

/// Extract the token from an `Authorization: Bearer ...` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor that requires a valid access token.
///
/// Fails with 401 when the credential is absent, malformed, or expired; the
/// handler is never invoked in that case.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_owned()))?;

        let claims = state.tokens().verify_access(token)?;

        let roles = RoleSet::from_roles(claims.roles)
            .map_err(|_| AppError::Unauthenticated("Invalid token".to_owned()))?;

        Ok(Self(CurrentUser {
            id: claims.sub,
            roles,
        }))
    }
}

/// Extractor that requires an ADMIN or `SUPER_ADMIN` caller.
///
/// 401 without a valid token, 403 when the role set does not intersect the
/// admin roles.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        require_any_role(&user, &[Role::Admin, Role::SuperAdmin])?;
        Ok(Self(user))
    }
}

/// Extractor that requires a `SUPER_ADMIN` caller.
pub struct RequireSuperAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        require_any_role(&user, &[Role::SuperAdmin])?;
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with("Bearer abc.def");
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_empty_bearer() {
        let headers = headers_with("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }
}
