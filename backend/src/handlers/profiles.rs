use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess};

use crate::handlers::{authenticate, household_error_response, profile_error_response};
use crate::models::AppState;
use crate::services::{households as household_service, profiles as profile_service};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/profiles/me", web::get().to(get_my_profile))
        .route("/leaderboard", web::get().to(get_leaderboard))
        .route("/household", web::get().to(get_household));
}

async fn get_my_profile(state: web::Data<AppState>, req: actix_web::HttpRequest) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match profile_service::get_profile(&state.db, &actor.user_id).await {
        Ok(Some(profile)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(profile))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Profile not found".to_string(),
        })),
        Err(e) => Ok(profile_error_response(&e)),
    }
}

async fn get_leaderboard(state: web::Data<AppState>, req: actix_web::HttpRequest) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match profile_service::get_leaderboard(&state.db, &actor.household_id).await {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiSuccess::new(entries))),
        Err(e) => Ok(profile_error_response(&e)),
    }
}

async fn get_household(state: web::Data<AppState>, req: actix_web::HttpRequest) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match household_service::get_household(&state.db, &actor.household_id).await {
        Ok(Some(household)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(household))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Household not found".to_string(),
        })),
        Err(e) => Ok(household_error_response(&e)),
    }
}
