use actix_web::{web, HttpResponse, Result};
use shared::{ApiSuccess, CreateTaskRequest, UpdateParticipantsRequest, UpdateTaskRequest};

use crate::handlers::{assignment_error_response, authenticate, parse_id, task_error_response};
use crate::models::AppState;
use crate::services::{assignments as assignment_service, tasks as task_service};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::get().to(list_tasks))
            .route("", web::post().to(create_task))
            .route("/{task_id}", web::get().to(get_task))
            .route("/{task_id}", web::put().to(update_task))
            .route("/{task_id}", web::delete().to(archive_task))
            .route("/{task_id}/participants", web::put().to(update_participants))
            .route("/{task_id}/assignments/pending", web::get().to(list_pending_assignments)),
    );
}

async fn list_tasks(state: web::Data<AppState>, req: actix_web::HttpRequest) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match task_service::list_tasks(&state.db, &actor.household_id).await {
        Ok(tasks) => Ok(HttpResponse::Ok().json(ApiSuccess::new(tasks))),
        Err(e) => Ok(task_error_response(&e)),
    }
}

async fn create_task(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match task_service::create_task(&state.db, &actor, &body.into_inner(), &clock).await {
        Ok(details) => Ok(HttpResponse::Created().json(ApiSuccess::new(details))),
        Err(e) => Ok(task_error_response(&e)),
    }
}

async fn get_task(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let task_id = match parse_id(&path.into_inner(), "task") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match task_service::get_task_details(&state.db, &actor, &task_id).await {
        Ok(details) => Ok(HttpResponse::Ok().json(ApiSuccess::new(details))),
        Err(e) => Ok(task_error_response(&e)),
    }
}

async fn update_task(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let task_id = match parse_id(&path.into_inner(), "task") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match task_service::update_task(&state.db, &actor, &task_id, &body.into_inner(), &clock).await {
        Ok(details) => Ok(HttpResponse::Ok().json(ApiSuccess::new(details))),
        Err(e) => Ok(task_error_response(&e)),
    }
}

async fn archive_task(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let task_id = match parse_id(&path.into_inner(), "task") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match task_service::archive_task(&state.db, &actor, &task_id, &clock).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiSuccess::new(summary))),
        Err(e) => Ok(task_error_response(&e)),
    }
}

async fn update_participants(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateParticipantsRequest>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let task_id = match parse_id(&path.into_inner(), "task") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match task_service::update_participants(&state.db, &actor, &task_id, &body.participants, &clock).await {
        Ok(details) => Ok(HttpResponse::Ok().json(ApiSuccess::new(details))),
        Err(e) => Ok(task_error_response(&e)),
    }
}

async fn list_pending_assignments(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let task_id = match parse_id(&path.into_inner(), "task") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::list_pending_for_task(&state.db, &actor, &task_id).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}
