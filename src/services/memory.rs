use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Account, NewAccount, ProfileFields, ProfileRecord};
use crate::services::store::{ProfileStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    emails: HashMap<String, Uuid>,
    profiles: HashMap<Uuid, ProfileRecord>,
    /// Profile ids in creation order
    order: Vec<Uuid>,
}

/// In-process store for development and tests.
///
/// A single lock guards all tables, so every write is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.emails.contains_key(&account.email) {
            return Err(StoreError::Conflict(format!(
                "account with email {} already exists",
                account.email
            )));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            name: account.name,
            created_at: chrono::Utc::now(),
        };

        tables.emails.insert(account.email.clone(), account.id);
        tables.accounts.insert(account.id, account.clone());

        tracing::debug!("Inserted account {}", account.id);
        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn insert_profile(
        &self,
        id: Uuid,
        fields: &ProfileFields,
    ) -> Result<ProfileRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.accounts.contains_key(&id) {
            return Err(StoreError::NotFound(format!("account {}", id)));
        }
        if tables.profiles.contains_key(&id) {
            return Err(StoreError::Conflict(format!("account {} already has a profile", id)));
        }

        let now = chrono::Utc::now();
        let record = ProfileRecord {
            id,
            fields: fields.clone(),
            revision: 1,
            created_at: now,
            updated_at: now,
        };

        tables.profiles.insert(id, record.clone());
        tables.order.push(id);

        Ok(record)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        expected_revision: i64,
        fields: &ProfileFields,
    ) -> Result<ProfileRecord, StoreError> {
        let mut tables = self.tables.write().await;

        let record = tables
            .profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;

        if record.revision != expected_revision {
            return Err(StoreError::Conflict(format!(
                "profile {} is at revision {}, expected {}",
                id, record.revision, expected_revision
            )));
        }

        record.fields = fields.clone();
        record.revision += 1;
        record.updated_at = chrono::Utc::now();

        Ok(record.clone())
    }

    async fn list_profiles(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ProfileRecord>, u64), StoreError> {
        let tables = self.tables.read().await;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let page = tables
            .order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect();

        Ok((page, tables.order.len() as u64))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
