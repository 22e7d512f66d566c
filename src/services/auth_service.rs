// src/services/auth_service.rs
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    db::DocumentStore,
    error::{AppError, AppResult},
    models::account::Account,
};

// Minimum cost under test
const HASH_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

/// Verifies a password against the stored bcrypt hash.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking failed (verify_password): {:?}", e);
            AppError::Unexpected("password verification task failed".to_string())
        })?
        .map_err(|e| {
            tracing::error!("bcrypt verify failed: {:?}", e);
            AppError::PasswordHashingError
        })
}

pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, HASH_COST))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking failed (hash_password): {:?}", e);
            AppError::Unexpected("password hashing task failed".to_string())
        })?
        .map_err(|e| {
            tracing::error!("bcrypt hash failed: {:?}", e);
            AppError::PasswordHashingError
        })
}

/// Token claims. Only `id` is trusted to identify the account.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(account_id: &str, secret: &str, ttl: Duration) -> AppResult<String> {
    issue_token_at(account_id, secret, ttl, Utc::now())
}

pub fn issue_token_at(account_id: &str, secret: &str, ttl: Duration, now: DateTime<Utc>) -> AppResult<String> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AppError::Unexpected(format!("token lifetime out of range: {e}")))?;
    let claims = Claims {
        id: account_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Unexpected(format!("failed to sign token: {e}")))
}

/// Accepts `Bearer <token>` or a bare token.
pub fn strip_bearer(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("Bearer ").map(str::trim).unwrap_or(raw)
}

/// Signature and expiry check, no storage access.
pub fn decode_token(secret: &str, raw: &str) -> AppResult<Claims> {
    let token = strip_bearer(raw);
    if token.is_empty() {
        return Err(AppError::InvalidCredential("Access token required".to_string()));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::ExpiredCredential,
            _ => AppError::InvalidCredential(e.to_string()),
        })
}

/// Resolves a bearer credential to an active account.
pub async fn verify_credential(store: &DocumentStore, secret: &str, raw: &str) -> AppResult<Account> {
    let claims = decode_token(secret, raw)?;
    let account: Account = store
        .find_by_id(&claims.id)
        .await?
        .ok_or_else(|| AppError::InvalidCredential(format!("no account for id {}", claims.id)))?;
    if !account.is_active {
        return Err(AppError::AccountDeactivated);
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_store,
        models::account::{sample_account, Role},
    };

    const SECRET: &str = "unit-test-secret";
    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[test]
    fn bearer_prefix_is_optional() {
        let token = issue_token("a1", SECRET, WEEK).unwrap();
        assert_eq!(decode_token(SECRET, &token).unwrap().id, "a1");
        assert_eq!(decode_token(SECRET, &format!("Bearer {token}")).unwrap().id, "a1");
    }

    #[test]
    fn forged_and_missing_tokens_are_invalid() {
        let token = issue_token("a1", "another-secret", WEEK).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidCredential(_))));
        assert!(matches!(decode_token(SECRET, "Bearer "), Err(AppError::InvalidCredential(_))));
        assert!(matches!(decode_token(SECRET, "garbage"), Err(AppError::InvalidCredential(_))));
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        for seconds_ago in [1, 60, 3_600, 30 * 24 * 3_600] {
            let issued = Utc::now() - chrono::Duration::seconds(seconds_ago) - chrono::Duration::hours(1);
            let token = issue_token_at("a1", SECRET, Duration::from_secs(3_600), issued).unwrap();
            assert!(matches!(decode_token(SECRET, &token), Err(AppError::ExpiredCredential)));
        }
    }

    #[tokio::test]
    async fn deactivated_accounts_are_refused_with_a_valid_token() {
        let store = test_store().await;
        let mut account = sample_account("a1", Role::Student);
        account.is_active = false;
        store.create(&account).await.unwrap();

        let token = issue_token("a1", SECRET, WEEK).unwrap();
        assert!(matches!(
            verify_credential(&store, SECRET, &token).await,
            Err(AppError::AccountDeactivated)
        ));

        let ghost = issue_token("ghost", SECRET, WEEK).unwrap();
        assert!(matches!(
            verify_credential(&store, SECRET, &ghost).await,
            Err(AppError::InvalidCredential(_))
        ));
    }

    #[tokio::test]
    async fn passwords_hash_and_verify() {
        let hash = hash_password("Secret123").await.unwrap();
        assert!(verify_password("Secret123", &hash).await.unwrap());
        assert!(!verify_password("secret123", &hash).await.unwrap());
    }
}
