use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::patch::FieldUpdate;

/// Interests as submitted: a comma-delimited string or a list of tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterestsInput {
    Delimited(String),
    List(Vec<String>),
}

/// Age as submitted by the form, which sends numbers or numeric strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Number(i64),
    Text(String),
}

/// Request to create a profile for an existing account
///
/// Every field is optional at the wire level so validation can report all
/// missing fields at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[serde(alias = "id")]
    pub owner_id: Option<String>,
    pub full_name: Option<String>,
    pub dob: Option<String>,
    pub height: Option<String>,
    pub mother_tongue: Option<String>,
    pub religion: Option<String>,
    pub marital_status: Option<String>,
    pub gender: Option<String>,
    pub income: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub about: Option<String>,
    pub interests: Option<InterestsInput>,
    pub profile_image: Option<String>,
    pub partner_preferences: Option<PartnerPreferencesInput>,
}

/// Partner preferences as submitted on profile creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPreferencesInput {
    pub gender: Option<String>,
    pub age_range_from: Option<AgeInput>,
    pub age_range_to: Option<AgeInput>,
    pub height_range_from: Option<String>,
    pub height_range_to: Option<String>,
    pub religion: Option<String>,
    pub mother_tongue: Option<String>,
    pub marital_status: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub income: Option<String>,
}

/// Partial profile update. Keys left out of the body stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: FieldUpdate<String>,
    #[serde(default)]
    pub dob: FieldUpdate<String>,
    #[serde(default)]
    pub height: FieldUpdate<String>,
    #[serde(default)]
    pub mother_tongue: FieldUpdate<String>,
    #[serde(default)]
    pub religion: FieldUpdate<String>,
    #[serde(default)]
    pub marital_status: FieldUpdate<String>,
    #[serde(default)]
    pub gender: FieldUpdate<String>,
    #[serde(default)]
    pub income: FieldUpdate<String>,
    #[serde(default)]
    pub education: FieldUpdate<String>,
    #[serde(default)]
    pub occupation: FieldUpdate<String>,
    #[serde(default, alias = "aboutMe")]
    pub about: FieldUpdate<String>,
    #[serde(default)]
    pub interests: FieldUpdate<InterestsInput>,
    #[serde(default, alias = "profilePicture")]
    pub profile_image: FieldUpdate<Option<String>>,
    #[serde(default)]
    pub partner_preferences: FieldUpdate<PartnerPreferencesUpdate>,
    /// Revision the caller last read; a mismatch rejects the update
    #[serde(default)]
    pub revision: Option<i64>,
}

/// Partial update of the nested partner preferences
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPreferencesUpdate {
    #[serde(default)]
    pub gender: FieldUpdate<String>,
    #[serde(default)]
    pub age_range_from: FieldUpdate<AgeInput>,
    #[serde(default)]
    pub age_range_to: FieldUpdate<AgeInput>,
    #[serde(default)]
    pub height_range_from: FieldUpdate<String>,
    #[serde(default)]
    pub height_range_to: FieldUpdate<String>,
    #[serde(default)]
    pub religion: FieldUpdate<String>,
    #[serde(default)]
    pub mother_tongue: FieldUpdate<String>,
    #[serde(default)]
    pub marital_status: FieldUpdate<String>,
    #[serde(default)]
    pub education: FieldUpdate<String>,
    #[serde(default)]
    pub occupation: FieldUpdate<String>,
    #[serde(default)]
    pub income: FieldUpdate<String>,
}

/// Pagination query for the match listing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProfilesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Account registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "does not match password"))]
    pub confirm_password: String,
}

/// Sign-in credentials
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Lookup query for resolving an account email to its owner id
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailQuery {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}
