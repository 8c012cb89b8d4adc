//! Signed, time-limited access tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

/// Default token lifetime in seconds (7 days).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 604_800;

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user ID (UUID string) |
/// | `email` | custom | account email at issue time |
/// | `role` | custom | lowercase role name |
/// | `iat` | `iat` | issued at, seconds since epoch |
/// | `exp` | `exp` | expiry, seconds since epoch |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: u64,
    pub exp: u64,
}

/// Identity a token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: UserId,
    pub email: &'a str,
    pub role: UserRole,
}

/// Freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Identity recovered from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub expires_at: u64,
}

/// Errors returned by [`TokenKeys`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime out of range")]
    LifetimeOverflow,
}

/// HMAC key pair plus the lifetime applied to issued tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Sign a token carrying the subject's id, email and role.
    pub fn issue(&self, subject: TokenSubject<'_>) -> Result<IssuedToken, TokenError> {
        let iat = now_secs();
        let exp = iat
            .checked_add(self.ttl_secs)
            .ok_or(TokenError::LifetimeOverflow)?;
        let claims = TokenClaims {
            sub: subject.user_id.to_string(),
            email: subject.email.to_owned(),
            role: subject.role,
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Sign)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Check signature and expiry, returning the identity the token carries.
    ///
    /// Validation: HS256, `exp` checked with the default 60s leeway, required
    /// claims `exp` + `sub`.
    pub fn verify(&self, token: &str) -> Result<TokenInfo, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Malformed)?;
        Ok(TokenInfo {
            user_id,
            email: data.claims.email,
            role: data.claims.role,
            expires_at: data.claims.exp,
        })
    }
}

/// Parse a `Bearer <token>` credential. Returns `None` for any other scheme
/// or an empty token.
pub fn bearer_token(header_value: Option<&str>) -> Option<&str> {
    let token = header_value?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
