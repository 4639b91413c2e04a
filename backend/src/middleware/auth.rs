use actix_web::HttpRequest;
use thiserror::Error;
use uuid::Uuid;

use crate::services::auth as auth_service;

/// Acting user from an `Authorization: Bearer <jwt>` header.
pub fn extract_user_id(req: &HttpRequest, jwt_secret: &str) -> Result<Uuid, AuthMiddlewareError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or(AuthMiddlewareError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthMiddlewareError::InvalidToken)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthMiddlewareError::InvalidToken)?;

    auth_service::verify_jwt(token, jwt_secret).map_err(|e| {
        log::debug!("Rejected bearer token: {}", e);
        AuthMiddlewareError::InvalidToken
    })
}

#[derive(Debug, Error)]
pub enum AuthMiddlewareError {
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
}
