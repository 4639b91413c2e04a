use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use chrono::Utc;
use shared::ApiError;
use uuid::Uuid;

use crate::models::AppState;
use crate::services::assignments::AssignmentError;
use crate::services::households::{self, HouseholdError};
use crate::services::profiles::{self as profile_service, Actor, ProfileError};
use crate::services::schedule::{self, HouseholdClock};
use crate::services::tasks::TaskError;

pub mod assignments;
pub mod preview;
pub mod profiles;
pub mod tasks;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(tasks::configure)
            .configure(assignments::configure)
            .configure(preview::configure)
            .configure(profiles::configure),
    );
}

fn api_error(mut builder: HttpResponseBuilder, error: &str, message: impl Into<String>) -> HttpResponse {
    builder.json(ApiError {
        error: error.to_string(),
        message: message.into(),
    })
}

pub(crate) fn unauthorized() -> HttpResponse {
    api_error(
        HttpResponse::Unauthorized(),
        "unauthorized",
        "Invalid or missing token",
    )
}

pub(crate) fn internal_error(context: &str, e: &dyn std::fmt::Display) -> HttpResponse {
    log::error!("{}: {}", context, e);
    api_error(
        HttpResponse::InternalServerError(),
        "internal_error",
        context,
    )
}

/// Parse a path id, answering 400 `invalid_id` when it is not a UUID.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        api_error(
            HttpResponse::BadRequest(),
            "invalid_id",
            format!("Invalid {} ID format", what),
        )
    })
}

/// Resolves the bearer token to an actor in a household and the household's clock.
pub(crate) async fn authenticate(
    state: &AppState,
    req: &HttpRequest,
) -> Result<(Actor, HouseholdClock), HttpResponse> {
    let user_id = crate::middleware::auth::extract_user_id(req, &state.config.jwt_secret)
        .map_err(|_| unauthorized())?;

    let actor = match profile_service::resolve_actor(&state.db, &user_id).await {
        Ok(actor) => actor,
        Err(ProfileError::NotFound) => return Err(unauthorized()),
        Err(e) => return Err(profile_error_response(&e)),
    };

    let fallback = schedule::parse_timezone(&state.config.default_timezone, chrono_tz::UTC);
    let tz = households::household_timezone(&state.db, &actor.household_id, fallback)
        .await
        .map_err(|e| household_error_response(&e))?;

    Ok((actor, HouseholdClock::new(Utc::now(), tz)))
}

pub(crate) fn profile_error_response(e: &ProfileError) -> HttpResponse {
    match e {
        ProfileError::NotFound => api_error(HttpResponse::NotFound(), "not_found", e.to_string()),
        ProfileError::NoHousehold => {
            api_error(HttpResponse::BadRequest(), "validation_error", e.to_string())
        }
        ProfileError::DatabaseError(_) | ProfileError::InvalidRow(_) => {
            internal_error("Failed to load profile", e)
        }
    }
}

pub(crate) fn household_error_response(e: &HouseholdError) -> HttpResponse {
    match e {
        HouseholdError::NotFound => api_error(HttpResponse::NotFound(), "not_found", e.to_string()),
        HouseholdError::DatabaseError(_) | HouseholdError::InvalidRow(_) => {
            internal_error("Failed to load household", e)
        }
    }
}

pub(crate) fn task_error_response(e: &TaskError) -> HttpResponse {
    match e {
        TaskError::NotFound => api_error(HttpResponse::NotFound(), "not_found", e.to_string()),
        TaskError::Archived => api_error(HttpResponse::Conflict(), "task_archived", e.to_string()),
        TaskError::Forbidden(message) => api_error(HttpResponse::Forbidden(), "forbidden", *message),
        TaskError::Validation(_) => {
            api_error(HttpResponse::BadRequest(), "validation_error", e.to_string())
        }
        TaskError::Profile(inner) => profile_error_response(inner),
        TaskError::DatabaseError(_) | TaskError::InvalidRow(_) => {
            internal_error("Failed to process task", e)
        }
    }
}

pub(crate) fn assignment_error_response(e: &AssignmentError) -> HttpResponse {
    match e {
        AssignmentError::NotFound => {
            api_error(HttpResponse::NotFound(), "not_found", e.to_string())
        }
        AssignmentError::AlreadyCompleted => {
            api_error(HttpResponse::Conflict(), "already_completed", e.to_string())
        }
        AssignmentError::NotCompleted => {
            api_error(HttpResponse::Conflict(), "not_completed", e.to_string())
        }
        AssignmentError::NotPending => {
            api_error(HttpResponse::Conflict(), "not_pending", e.to_string())
        }
        AssignmentError::Archived => {
            api_error(HttpResponse::Conflict(), "task_archived", e.to_string())
        }
        AssignmentError::CompletionLocked(message) => {
            api_error(HttpResponse::Conflict(), "completion_locked", message.clone())
        }
        AssignmentError::Forbidden(message) => {
            api_error(HttpResponse::Forbidden(), "forbidden", *message)
        }
        AssignmentError::Validation(_) => {
            api_error(HttpResponse::BadRequest(), "validation_error", e.to_string())
        }
        AssignmentError::Task(inner) => task_error_response(inner),
        AssignmentError::Profile(inner) => profile_error_response(inner),
        AssignmentError::DatabaseError(_) | AssignmentError::InvalidRow(_) => {
            internal_error("Failed to process assignment", e)
        }
    }
}
