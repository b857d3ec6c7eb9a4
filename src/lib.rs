//! Saathi - profile service for a matrimonial matchmaking site
//!
//! Accounts sign up and sign in with a password, create one profile each
//! with nested partner preferences, update it field by field, and browse the
//! complete profiles of others page by page.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ProfileService, ServiceError};
pub use crate::models::{HeightBand, IncomeBand, ProfileFields, ProfileView};
pub use crate::services::{AuthService, MemoryStore, PostgresStore, ProfileStore};
