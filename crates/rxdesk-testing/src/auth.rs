//! Bearer credentials for tests.
//!
//! Signs real tokens with a throwaway secret so handlers run through the
//! same `Identity` extractor they use in production.

use axum::http::{HeaderName, HeaderValue, header::AUTHORIZATION};

use rxdesk_auth_types::token::{TokenKeys, TokenSubject};
use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;

/// Secret shared by test app state and [`MockAuth`].
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

/// Keys built from [`TEST_JWT_SECRET`] with a one hour lifetime.
pub fn test_token_keys() -> TokenKeys {
    TokenKeys::new(TEST_JWT_SECRET, 3600)
}

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: UserId, email: &str, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.to_owned(),
            role,
        }
    }

    /// A fresh identity with the given role.
    pub fn with_role(role: UserRole) -> Self {
        Self::new(UserId::generate(), "tester@example.com", role)
    }

    /// Signed token for this identity.
    pub fn token(&self) -> String {
        test_token_keys()
            .issue(TokenSubject {
                user_id: self.user_id,
                email: &self.email,
                role: self.role,
            })
            .expect("sign test token")
            .token
    }

    /// `Authorization: Bearer <token>` header pair.
    pub fn header(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token()))
            .expect("bearer header value");
        (AUTHORIZATION, value)
    }
}
