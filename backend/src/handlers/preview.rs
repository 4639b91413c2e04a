use actix_web::{web, HttpResponse, Result};
use shared::{
    ApiError, ApiSuccess, NextAssigneeRequest, NextAssigneeResponse, NextDueRequest, NextDueResponse, Recurrence,
};

use crate::handlers::unauthorized;
use crate::models::AppState;
use crate::services::{rotation, schedule};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/preview")
            .route("/next-due", web::post().to(next_due))
            .route("/next-assignee", web::post().to(next_assignee)),
    );
}

/// Where a schedule lands after `from`, without touching any task.
async fn next_due(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<NextDueRequest>,
) -> Result<HttpResponse> {
    if crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret).is_err() {
        return Ok(unauthorized());
    }

    let body = body.into_inner();
    let recurrence = match Recurrence::new(
        body.frequency_type,
        body.frequency_value,
        body.scheduled_days,
        body.scheduled_time,
    ) {
        Ok(r) => r,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "validation_error".to_string(),
                message: e.to_string(),
            }));
        }
    };

    let due_at = schedule::next_due_date(
        recurrence.frequency_type,
        recurrence.frequency_value,
        body.from,
        &recurrence.scheduled_days,
        recurrence.scheduled_time,
    );

    Ok(HttpResponse::Ok().json(ApiSuccess::new(NextDueResponse {
        due_date: due_at.date(),
        due_at,
    })))
}

async fn next_assignee(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<NextAssigneeRequest>,
) -> Result<HttpResponse> {
    if crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret).is_err() {
        return Ok(unauthorized());
    }

    let next = rotation::next_assignee(&body.participants, body.current_assignee);
    Ok(HttpResponse::Ok().json(ApiSuccess::new(NextAssigneeResponse { next_assignee: next })))
}
