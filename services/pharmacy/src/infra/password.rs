//! Argon2id password hashing.
//!
//! Both operations are CPU-bound and run on the blocking pool.

use anyhow::Context as _;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Hash `plaintext` with a fresh random salt. Returns a PHC string.
pub async fn hash_password(plaintext: &str) -> anyhow::Result<String> {
    let plaintext = plaintext.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("hash password: {e}"))
    })
    .await
    .context("join password hashing task")?
}

/// Check `plaintext` against a stored PHC string. Any failure, including an
/// unparseable hash, counts as a mismatch.
pub async fn verify_password(plaintext: &str, password_hash: &str) -> bool {
    let plaintext = plaintext.to_owned();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || {
        PasswordHash::new(&password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "password verification task failed");
        false
    })
}
