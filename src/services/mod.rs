// Service exports
pub mod auth;
pub mod memory;
pub mod postgres;
pub mod store;

pub use auth::{verify_password, AuthError, AuthService, Claims};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{ProfileStore, StoreError};
