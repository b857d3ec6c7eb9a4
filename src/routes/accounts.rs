use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::ServiceError;
use crate::models::{EmailQuery, HealthResponse, IdResponse, SignInRequest, SignUpRequest};
use crate::routes::AppState;
use crate::services::AuthError;

/// Configure account, session and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/accounts", web::post().to(sign_up))
        .route("/accounts/by-email", web::get().to(account_by_email))
        .route("/sessions", web::post().to(sign_in));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let status = if state.profiles.health_check().await {
        "healthy"
    } else {
        "degraded"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Register an account
///
/// POST /accounts
///
/// ```json
/// { "name": "string", "email": "string", "password": "string", "confirmPassword": "string" }
/// ```
async fn sign_up(
    state: web::Data<AppState>,
    body: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ServiceError> {
    let id = state.auth.sign_up(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

/// Sign in and receive a bearer token
///
/// POST /sessions
async fn sign_in(
    state: web::Data<AppState>,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, AuthError> {
    let session = state.auth.sign_in(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /accounts/by-email?email={email}
async fn account_by_email(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, ServiceError> {
    query.validate()?;
    let id = state.auth.account_id_by_email(&query.email).await?;
    Ok(HttpResponse::Ok().json(IdResponse { id }))
}
