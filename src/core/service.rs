use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::error::ServiceError;
use crate::core::pagination::PageRequest;
use crate::core::validation::{check_partner_ranges, validate_new_profile, validate_patch};
use crate::models::{
    CreateProfileRequest, ListProfilesQuery, ProfilePage, ProfileView, UpdateProfileRequest,
};
use crate::services::store::{read_with_retry, with_timeout, ProfileStore};

/// Profile record service: create, partially update, fetch and page through profiles
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    call_timeout: Duration,
    default_page_size: u32,
    max_page_size: u32,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        call_timeout: Duration,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        Self {
            store,
            call_timeout,
            default_page_size,
            max_page_size,
        }
    }

    /// Validate and persist a new profile for an existing account
    pub async fn create_profile(&self, request: CreateProfileRequest) -> Result<Uuid, ServiceError> {
        let (owner_id, fields) =
            validate_new_profile(request, today()).map_err(ServiceError::Validation)?;

        let account = read_with_retry(self.call_timeout, || self.store.find_account(owner_id)).await?;
        if account.is_none() {
            return Err(ServiceError::NotFound(format!("account {}", owner_id)));
        }

        let record = with_timeout(self.call_timeout, self.store.insert_profile(owner_id, &fields)).await?;

        tracing::info!("Created profile {} (revision {})", record.id, record.revision);
        Ok(record.id)
    }

    /// Merge the supplied fields into the stored profile.
    ///
    /// The write only lands if nobody else updated the profile since it was read.
    pub async fn update_profile(
        &self,
        owner_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<ProfileView, ServiceError> {
        let expected = request.revision;
        let patch = validate_patch(request, today()).map_err(ServiceError::Validation)?;

        let current = read_with_retry(self.call_timeout, || self.store.find_profile(owner_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile {}", owner_id)))?;

        if let Some(expected) = expected {
            if expected != current.revision {
                return Err(ServiceError::Conflict(format!(
                    "profile {} is at revision {}, request expected {}",
                    owner_id, current.revision, expected
                )));
            }
        }

        if patch.is_empty() {
            tracing::debug!("Empty update for profile {}", owner_id);
            return Ok(current.into());
        }

        let merged = patch.apply(&current.fields).map_err(ServiceError::Validation)?;

        if let Some(preferences) = &merged.partner_preferences {
            let errors = check_partner_ranges(preferences);
            if !errors.is_empty() {
                return Err(ServiceError::Validation(errors));
            }
        }

        let updated = with_timeout(
            self.call_timeout,
            self.store.update_profile(owner_id, current.revision, &merged),
        )
        .await?;

        tracing::info!("Updated profile {} to revision {}", owner_id, updated.revision);
        Ok(updated.into())
    }

    pub async fn get_profile(&self, owner_id: Uuid) -> Result<ProfileView, ServiceError> {
        read_with_retry(self.call_timeout, || self.store.find_profile(owner_id))
            .await?
            .map(ProfileView::from)
            .ok_or_else(|| ServiceError::NotFound(format!("profile {}", owner_id)))
    }

    /// Whether the owner has a stored (and therefore complete) profile
    pub async fn has_profile(&self, owner_id: Uuid) -> Result<bool, ServiceError> {
        let profile = read_with_retry(self.call_timeout, || self.store.find_profile(owner_id)).await?;
        Ok(profile.is_some())
    }

    /// One page of complete profiles in creation order
    pub async fn list_profiles(&self, query: ListProfilesQuery) -> Result<ProfilePage, ServiceError> {
        let page = PageRequest::from_query(query, self.default_page_size, self.max_page_size)
            .map_err(ServiceError::Validation)?;

        let (records, total) = read_with_retry(self.call_timeout, || {
            self.store.list_profiles(page.offset(), page.limit())
        })
        .await?;

        tracing::debug!(
            "Listing page {} (size {}): {} of {} profiles",
            page.page,
            page.page_size,
            records.len(),
            total
        );

        Ok(ProfilePage {
            items: records.into_iter().map(ProfileView::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total,
            total_pages: page.total_pages(total),
        })
    }

    pub async fn health_check(&self) -> bool {
        match with_timeout(self.call_timeout, self.store.health_check()).await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
