use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::core::ServiceError;
use crate::models::Session;
use crate::routes::AppState;
use crate::services::AuthError;

/// Resolves `Authorization: Bearer <token>` into the caller's session
impl FromRequest for Session {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Session, AuthError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        AuthError::Service(ServiceError::Store("application state is not configured".to_string()))
    })?;

    let token = bearer_token(req)?;
    state.auth.verify_session(token)
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("authorization header is not valid ASCII".to_string()))?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::MissingToken),
    }
}

impl Session {
    /// Only the owner may mutate their profile
    pub fn require_owner(&self, owner_id: Uuid) -> Result<(), AuthError> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            tracing::info!("Account {} tried to modify profile {}", self.user_id, owner_id);
            Err(AuthError::Forbidden(format!(
                "profile {} does not belong to the signed-in account",
                owner_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc.def.ghi");

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "bearer   abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc");
    }

    #[test]
    fn test_missing_or_foreign_scheme() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::MissingToken)));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_require_owner() {
        let session = Session {
            user_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
        };
        assert!(session.require_owner(session.user_id).is_ok());
        assert!(matches!(
            session.require_owner(Uuid::new_v4()),
            Err(AuthError::Forbidden(_))
        ));
    }
}
