//! Bearer-token authentication extractor and role authorization.
//!
//! Per request:
//! - no `Authorization: Bearer` credential → 401 "Access token is required"
//! - token invalid or expired → 401 "Invalid or expired token"
//! - token valid → [`Identity`] attached, handler continues
//!
//! Authorization ([`authorize`]) then yields 401 when no identity is present
//! and 403 when the role is outside the allowed set.

use std::future::{Future, ready};

use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::AUTHORIZATION;
use http::request::Parts;

use rxdesk_core::envelope::Envelope;
use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

use crate::token::{TokenKeys, bearer_token};

/// Authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

/// Why a request was turned away before reaching its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("Access token is required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
}

impl AuthRejection {
    pub fn status(self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Envelope::failure(self.status(), self.to_string(), None).into_response()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    TokenKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    // Verification is synchronous, so the future is resolved before returning.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        ready(authenticate(&TokenKeys::from_ref(state), header))
    }
}

/// Resolve an `Authorization` header value into an [`Identity`].
pub fn authenticate(
    keys: &TokenKeys,
    header_value: Option<&str>,
) -> Result<Identity, AuthRejection> {
    let token = bearer_token(header_value).ok_or(AuthRejection::MissingToken)?;
    let info = keys.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AuthRejection::InvalidToken
    })?;
    Ok(Identity {
        user_id: info.user_id,
        email: info.email,
        role: info.role,
    })
}

/// Allow the request only when an identity is present and its role is in `allowed`.
pub fn authorize<'a>(
    identity: Option<&'a Identity>,
    allowed: &[UserRole],
) -> Result<&'a Identity, AuthRejection> {
    let identity = identity.ok_or(AuthRejection::Unauthenticated)?;
    if allowed.contains(&identity.role) {
        Ok(identity)
    } else {
        Err(AuthRejection::Forbidden)
    }
}
