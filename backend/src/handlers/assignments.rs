use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use shared::{ApiError, ApiSuccess, AssignmentStateFilter, AssignmentView, ReassignRequest};

use crate::handlers::{assignment_error_response, authenticate, parse_id};
use crate::models::AppState;
use crate::services::assignments as assignment_service;

#[derive(Debug, Default, Deserialize)]
struct StateQuery {
    #[serde(default)]
    state: AssignmentStateFilter,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/assignments")
            .route("", web::get().to(list_assignments))
            .route("/mine", web::get().to(list_my_assignments))
            .route("/views/{view}", web::get().to(get_view))
            // Per-assignment endpoints
            .route("/{assignment_id}/can-complete", web::get().to(can_complete))
            .route("/{assignment_id}/complete", web::post().to(complete_assignment))
            .route("/{assignment_id}/uncomplete", web::post().to(uncomplete_assignment))
            .route("/{assignment_id}/reassign", web::post().to(reassign_assignment)),
    );
}

async fn list_assignments(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    query: web::Query<StateQuery>,
) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::list_household_assignments(&state.db, &actor.household_id, query.state).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}

async fn list_my_assignments(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    query: web::Query<StateQuery>,
) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::list_user_assignments(&state.db, &actor.household_id, &actor.user_id, query.state)
        .await
    {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}

async fn get_view(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let raw = path.into_inner();
    let view: AssignmentView = match raw.parse() {
        Ok(view) => view,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_view".to_string(),
                message: format!("Unknown assignment view '{}'", raw),
            }));
        }
    };

    match assignment_service::assignment_view(&state.db, &actor, view, &clock).await {
        Ok(assignments) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignments))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}

async fn can_complete(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let assignment_id = match parse_id(&path.into_inner(), "assignment") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::check_completion(&state.db, &actor, &assignment_id, &clock).await {
        Ok(check) => Ok(HttpResponse::Ok().json(ApiSuccess::new(check))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}

async fn complete_assignment(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let assignment_id = match parse_id(&path.into_inner(), "assignment") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::complete_assignment(&state.db, &actor, &assignment_id, &clock).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiSuccess::new(summary))),
        Err(e) => {
            log::debug!("Completion of {} by {} rejected: {}", assignment_id, actor.user_id, e);
            Ok(assignment_error_response(&e))
        }
    }
}

async fn uncomplete_assignment(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let (actor, clock) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let assignment_id = match parse_id(&path.into_inner(), "assignment") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::uncomplete_assignment(&state.db, &actor, &assignment_id, &clock).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiSuccess::new(summary))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}

async fn reassign_assignment(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<ReassignRequest>,
) -> Result<HttpResponse> {
    let (actor, _) = match authenticate(&state, &req).await {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    let assignment_id = match parse_id(&path.into_inner(), "assignment") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match assignment_service::reassign_assignment(&state.db, &actor, &assignment_id, &body.assigned_to).await {
        Ok(assignment) => Ok(HttpResponse::Ok().json(ApiSuccess::new(assignment))),
        Err(e) => Ok(assignment_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;
    use shared::Role;
    use uuid::Uuid;

    use crate::db::test_support::{insert_household, insert_profile};
    use crate::handlers::configure_routes;
    use crate::handlers::test_support::{bearer, test_state};

    #[actix_web::test]
    async fn test_complete_twice_conflicts() {
        let state = test_state().await;
        let household = insert_household(&state.db, "UTC").await;
        let admin = insert_profile(&state.db, Some(household), "Ana", Role::Admin).await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(bearer(admin))
            .set_json(json!({ "title": "Water plants", "points_value": 7 }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let assignment_id = body["data"]["pending_assignments"][0]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/assignments/{}/can-complete", assignment_id))
            .insert_header(bearer(admin))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["allowed"], true);

        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/{}/complete", assignment_id))
            .insert_header(bearer(admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["base_points"], 7);
        assert_eq!(body["data"]["new_streak"], 1);
        assert!(body["data"]["next_assignment"].is_null());

        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/{}/complete", assignment_id))
            .insert_header(bearer(admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "already_completed");

        let req = test::TestRequest::get()
            .uri("/api/assignments?state=completed")
            .insert_header(bearer(admin))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/assignments/views/completed")
            .insert_header(bearer(admin))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_unknown_view_and_missing_assignment() {
        let state = test_state().await;
        let household = insert_household(&state.db, "UTC").await;
        let member = insert_profile(&state.db, Some(household), "Ben", Role::Member).await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get()
            .uri("/api/assignments/views/someday")
            .insert_header(bearer(member))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/{}/complete", Uuid::new_v4()))
            .insert_header(bearer(member))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_reassign_requires_admin() {
        let state = test_state().await;
        let household = insert_household(&state.db, "UTC").await;
        let admin = insert_profile(&state.db, Some(household), "Ana", Role::Admin).await;
        let member = insert_profile(&state.db, Some(household), "Ben", Role::Member).await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(bearer(admin))
            .set_json(json!({ "title": "Vacuum", "participants": [admin] }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let assignment_id = body["data"]["pending_assignments"][0]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/{}/reassign", assignment_id))
            .insert_header(bearer(member))
            .set_json(json!({ "assigned_to": member }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/{}/reassign", assignment_id))
            .insert_header(bearer(admin))
            .set_json(json!({ "assigned_to": member }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["assigned_to"], member.to_string());

        let req = test::TestRequest::get()
            .uri("/api/assignments/mine?state=pending")
            .insert_header(bearer(member))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }
}
