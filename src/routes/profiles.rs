use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::models::{CreateProfileRequest, IdResponse, ListProfilesQuery, Session, UpdateProfileRequest};
use crate::routes::AppState;
use crate::services::AuthError;

/// Configure profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/profiles")
            .route(web::post().to(create_profile))
            .route(web::get().to(list_profiles)),
    )
    .service(
        web::resource("/profiles/{id}")
            .route(web::get().to(get_profile))
            .route(web::patch().to(update_profile)),
    );
}

/// Create the signed-in account's profile
///
/// POST /profiles
///
/// `ownerId` defaults to the session's account and must match it when given.
async fn create_profile(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateProfileRequest>,
) -> Result<HttpResponse, AuthError> {
    let mut request = body.into_inner();

    match request.owner_id.as_deref().map(Uuid::parse_str) {
        None => request.owner_id = Some(session.user_id.to_string()),
        Some(Ok(owner_id)) => session.require_owner(owner_id)?,
        // Reported by validation
        Some(Err(_)) => {}
    }

    let id = state.profiles.create_profile(request).await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

/// GET /profiles/{id}
async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AuthError> {
    let profile = state.profiles.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Partially update a profile
///
/// PATCH /profiles/{id}
///
/// Keys missing from the body are left untouched; `profileImage: null`
/// clears the image.
async fn update_profile(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AuthError> {
    let owner_id = path.into_inner();
    session.require_owner(owner_id)?;

    let profile = state.profiles.update_profile(owner_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Browse complete profiles
///
/// GET /profiles?page=1&pageSize=10
///
/// Only accounts that have completed their own profile may browse.
async fn list_profiles(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<ListProfilesQuery>,
) -> Result<HttpResponse, AuthError> {
    if !state.profiles.has_profile(session.user_id).await? {
        return Err(AuthError::ProfileIncomplete);
    }

    let page = state.profiles.list_profiles(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}
