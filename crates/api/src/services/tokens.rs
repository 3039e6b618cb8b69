//! Signed access/refresh tokens.
//!
//! Tokens are compact two-part strings: `base64url(claims) . base64url(mac)`,
//! where the MAC is HMAC-SHA256 over the serialized claims. The claims embed
//! the subject id, the role set, the token kind, and issue/expiry timestamps.
//! Verification is pure CPU work — no store lookup is involved.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use tradepost_core::{Role, RoleSet, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Errors from token verification (or, rarely, issuance).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not a two-part token, bad base64, or undecodable claims.
    #[error("malformed token")]
    Malformed,

    /// The MAC does not match the claims.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is past its expiry.
    #[error("token expired")]
    Expired,

    /// A refresh token was presented where an access token is required.
    #[error("wrong token kind")]
    WrongKind,

    /// Claims could not be serialized at issuance.
    #[error("failed to encode claims")]
    Encoding,
}

/// Whether a token grants access or only a future refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The signed payload carried by every token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: UserId,
    /// The role set at issuance time.
    pub roles: Vec<Role>,
    /// Access or refresh.
    pub kind: TokenKind,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Issues and verifies signed tokens.
#[derive(Clone)]
pub struct TokenService {
    key: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            key: secret.expose_secret().as_bytes().to_vec(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access token for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if the claims cannot be serialized.
    pub fn issue_access(&self, user: UserId, roles: &RoleSet) -> Result<String, TokenError> {
        self.issue_at(user, roles, TokenKind::Access, Utc::now())
    }

    /// Issue a refresh token for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if the claims cannot be serialized.
    pub fn issue_refresh(&self, user: UserId, roles: &RoleSet) -> Result<String, TokenError> {
        self.issue_at(user, roles, TokenKind::Refresh, Utc::now())
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when the token is malformed, tampered with,
    /// expired, or not an access token.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    fn issue_at(
        &self,
        user: UserId,
        roles: &RoleSet,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        #[allow(clippy::cast_possible_wrap)] // TTLs are far below i64::MAX seconds
        let claims = Claims {
            sub: user,
            roles: roles.as_slice().to_vec(),
            kind,
            iat: now.timestamp(),
            exp: now.timestamp() + ttl.as_secs() as i64,
        };

        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Encoding)?;
        let mac = self.mac_over(&payload);

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(mac)
        ))
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (payload_b64, mac_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        let mac = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|_| TokenError::Malformed)?;

        // Constant-time comparison via hmac's verify
        self.hmac()
            .chain_update(&payload)
            .verify_slice(&mac)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        if claims.kind != TokenKind::Access {
            return Err(TokenError::WrongKind);
        }

        Ok(claims)
    }

    fn hmac(&self) -> HmacSha256 {
        // HMAC accepts a key of any length, so this cannot fail
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length")
    }

    fn mac_over(&self, payload: &[u8]) -> Vec<u8> {
        self.hmac().chain_update(payload).finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("key", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn service() -> TokenService {
        TokenService::new(
            &SecretString::from("k9Qv3mZ8pX1wN5rT7uB2dF6hJ4sL0aGc"),
            Duration::from_secs(900),
            Duration::from_secs(1_209_600),
        )
    }

    fn roles() -> RoleSet {
        RoleSet::from_roles([Role::Seller, Role::Admin]).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let svc = service();
        let user = UserId::generate();
        let token = svc.issue_access(user, &roles()).unwrap();

        let claims = svc.verify_access(&token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.roles, vec![Role::Seller, Role::Admin]);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let now = Utc::now();
        let token = svc
            .issue_at(UserId::generate(), &roles(), TokenKind::Access, now)
            .unwrap();

        let later = now + TimeDelta::seconds(901);
        assert_eq!(svc.verify_at(&token, later), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_valid_just_before_expiry() {
        let svc = service();
        let now = Utc::now();
        let token = svc
            .issue_at(UserId::generate(), &roles(), TokenKind::Access, now)
            .unwrap();

        let almost = now + TimeDelta::seconds(899);
        assert!(svc.verify_at(&token, almost).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let svc = service();
        let token = svc.issue_access(UserId::generate(), &roles()).unwrap();

        // Re-encode a modified payload while keeping the original MAC
        let (payload_b64, mac_b64) = token.split_once('.').unwrap();
        let mut payload = URL_SAFE_NO_PAD.decode(payload_b64).unwrap();
        let json = String::from_utf8(payload.clone()).unwrap();
        let forged = json.replace("\"SELLER\"", "\"SUPER_ADMIN\"");
        payload = forged.into_bytes();
        let tampered = format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), mac_b64);

        assert_eq!(
            svc.verify_access(&tampered),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = service()
            .issue_access(UserId::generate(), &roles())
            .unwrap();

        let other = TokenService::new(
            &SecretString::from("A0b1C2d3E4f5G6h7I8j9K0l1M2n3O4p5"),
            Duration::from_secs(900),
            Duration::from_secs(1_209_600),
        );
        assert_eq!(other.verify_access(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_refresh_token_not_accepted_for_access() {
        let svc = service();
        let token = svc.issue_refresh(UserId::generate(), &roles()).unwrap();
        assert_eq!(svc.verify_access(&token), Err(TokenError::WrongKind));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let svc = service();
        assert_eq!(svc.verify_access(""), Err(TokenError::Malformed));
        assert_eq!(svc.verify_access("no-dot"), Err(TokenError::Malformed));
        assert_eq!(
            svc.verify_access("not!base64.also not base64"),
            Err(TokenError::Malformed)
        );
    }
}
