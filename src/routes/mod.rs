// Route exports
pub mod accounts;
pub mod errors;
pub mod profiles;
pub mod session;

use actix_web::web;

use crate::core::ProfileService;
use crate::services::AuthService;

pub use errors::{handle_json_payload_error, handle_query_payload_error};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    pub auth: AuthService,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(accounts::configure)
        .configure(profiles::configure);
}
