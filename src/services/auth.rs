use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::config::AuthSettings;
use crate::core::error::ServiceError;
use crate::models::{Account, NewAccount, Session, SessionResponse, SignInRequest, SignUpRequest};
use crate::services::store::{read_with_retry, with_timeout, ProfileStore, StoreError};

/// Errors raised while establishing or checking a session
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Complete your profile before browsing matches")]
    ProfileIncomplete,

    #[error("Failed to sign session token: {0}")]
    Signing(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
}

/// Account registration, password sign-in and session tokens
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn ProfileStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    session_ttl: chrono::Duration,
    bcrypt_cost: u32,
    call_timeout: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn ProfileStore>, settings: &AuthSettings, call_timeout: Duration) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            issuer: settings.issuer.clone(),
            session_ttl: chrono::Duration::minutes(settings.session_ttl_mins),
            bcrypt_cost: settings.bcrypt_cost,
            call_timeout,
        }
    }

    /// Register a new account and return its id
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Uuid, ServiceError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let password = request.password.clone();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ServiceError::Store(format!("password hashing task failed: {}", e)))?
            .map_err(|e| ServiceError::Store(format!("password hashing failed: {}", e)))?;

        let account = with_timeout(
            self.call_timeout,
            self.store.insert_account(NewAccount {
                email,
                password_hash,
                name: request.name.trim().to_string(),
            }),
        )
        .await?;

        tracing::info!("Registered account {}", account.id);
        Ok(account.id)
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn sign_in(&self, request: SignInRequest) -> Result<SessionResponse, AuthError> {
        request.validate().map_err(ServiceError::from)?;
        let email = normalize_email(&request.email);

        let account = read_with_retry(self.call_timeout, || {
            self.store.find_account_by_email(&email)
        })
        .await?;

        let Some(account) = account else {
            tracing::info!("Sign-in rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let password = request.password;
        let hash = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::Store(format!("password check task failed: {}", e)))?;

        if !matches {
            tracing::info!("Sign-in rejected for account {}", account.id);
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&account)
    }

    /// Sign a session token for an account
    pub fn issue_session(&self, account: &Account) -> Result<SessionResponse, AuthError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.session_ttl;

        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            iat: issued_at.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(SessionResponse {
            token,
            user_id: account.id,
            expires_at,
        })
    }

    /// Check signature, issuer and expiry of a session token
    pub fn verify_session(&self, token: &str) -> Result<Session, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not an account id".to_string()))?;

        Ok(Session {
            user_id,
            email: claims.email,
        })
    }

    /// Resolve an account email to the owner id used by profile routes
    pub async fn account_id_by_email(&self, email: &str) -> Result<Uuid, ServiceError> {
        let email = normalize_email(email);

        read_with_retry(self.call_timeout, || self.store.find_account_by_email(&email))
            .await?
            .map(|account| account.id)
            .ok_or_else(|| ServiceError::NotFound(format!("no account for {}", email)))
    }
}

/// Compare a plaintext password against a stored bcrypt hash.
/// A malformed hash never verifies.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
