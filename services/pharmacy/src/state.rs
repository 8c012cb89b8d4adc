use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use rxdesk_auth_types::token::TokenKeys;

use crate::infra::db::{DbPharmacyConfigRepository, DbUserRepository};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub token_keys: TokenKeys,
    /// Serializes writes that change the partner profit-share total.
    pub partner_writes: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, token_keys: TokenKeys) -> Self {
        Self {
            db,
            token_keys,
            partner_writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
            partner_writes: Arc::clone(&self.partner_writes),
        }
    }

    pub fn config_repo(&self) -> DbPharmacyConfigRepository {
        DbPharmacyConfigRepository {
            db: self.db.clone(),
        }
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.token_keys.clone()
    }
}
