// Core exports
pub mod error;
pub mod interests;
pub mod pagination;
pub mod patch;
pub mod service;
pub mod validation;

pub use error::{FieldError, ServiceError};
pub use interests::{normalize_interests, normalize_tags};
pub use pagination::PageRequest;
pub use patch::{FieldUpdate, PartnerPreferencesPatch, ProfilePatch};
pub use service::ProfileService;
pub use validation::{check_partner_ranges, validate_new_profile, validate_patch};
