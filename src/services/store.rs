use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, NewAccount, ProfileFields, ProfileRecord};

/// Errors that can occur when talking to the profile store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Failures of the backend itself, as opposed to answers about the data
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::SqlxError(_) | StoreError::Timeout(_)
        )
    }
}

/// Persistence for accounts, profiles and their partner preferences.
///
/// A profile shares its id with the owning account and exists once
/// `insert_profile` has succeeded. Writes of a profile and its nested
/// preferences are atomic.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Register an account. Fails with `Conflict` if the email is taken.
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, StoreError>;

    /// Attach a profile to an account. `NotFound` if the account does not
    /// exist, `Conflict` if it already has a profile.
    async fn insert_profile(
        &self,
        id: Uuid,
        fields: &ProfileFields,
    ) -> Result<ProfileRecord, StoreError>;

    /// Replace the stored profile if its revision still equals
    /// `expected_revision`, bumping the revision. `Conflict` otherwise.
    async fn update_profile(
        &self,
        id: Uuid,
        expected_revision: i64,
        fields: &ProfileFields,
    ) -> Result<ProfileRecord, StoreError>;

    /// Complete profiles in creation order, plus the total count
    async fn list_profiles(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ProfileRecord>, u64), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Bound a single store call by `limit`
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(StoreError::Timeout(limit)))
}

/// Run an idempotent read, retrying once if the backend failed.
///
/// Never use this for writes: a retried merge could apply twice.
pub async fn read_with_retry<T, F, Fut>(limit: Duration, read: F) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match with_timeout(limit, read()).await {
        Err(e) if e.is_transient() => {
            tracing::warn!("Store read failed, retrying once: {}", e);
            with_timeout(limit, read()).await
        }
        other => other,
    }
}
