use actix_web::http::header::{self, ContentType};
use actix_web::web::Bytes;
use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::auth::AuthenticatedUser;
use crate::cache::{todo_list_key, TODOS_TAG};
use crate::error::AppError;
use crate::error::ErrorBody;
use crate::models::todo::{CreateTodo, TodoItem, UpdateTodo};
use crate::service::TodoService;

pub const CACHE_HEADER: &str = "X-Cache";

fn json_listing(body: Bytes, status: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header((CACHE_HEADER, status))
        .body(body)
}

#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "todos",
    responses(
        (status = 200, description = "The caller's todos ordered by id", body = [TodoItem]),
        (status = 401, description = "No valid session"),
    ),
    security(("session" = []))
)]
#[get("/todos")]
pub async fn get_todos(
    user: AuthenticatedUser,
    todos: web::Data<TodoService>,
) -> Result<HttpResponse, AppError> {
    let key = todo_list_key(user.id());
    if let Some(body) = todos.cache().get(&key) {
        return Ok(json_listing(body, "HIT"));
    }
    let pending = todos.cache().claim(key, &[TODOS_TAG]);
    let items = todos.list(user.id()).await?;
    let body = serde_json::to_vec(&items).map_err(|err| AppError::Internal(err.to_string()))?;
    let body = Bytes::from(body);
    todos.cache().fill(pending, body.clone());
    Ok(json_listing(body, "MISS"))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    tag = "todos",
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Created", body = TodoItem),
        (status = 400, description = "Invalid input or antiforgery token", body = ErrorBody),
        (status = 401, description = "No valid session"),
    ),
    security(("session" = [], "antiforgery" = []))
)]
#[post("/todos")]
pub async fn create_todo(
    user: AuthenticatedUser,
    todos: web::Data<TodoService>,
    new_todo: web::Json<CreateTodo>,
) -> Result<HttpResponse, AppError> {
    let todo = todos.create(user.id(), new_todo.into_inner()).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/todos/{}", todo.id)))
        .json(todo))
}

#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    tag = "todos",
    params(("id" = i32, Path, description = "Todo id")),
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Updated", body = TodoItem),
        (status = 400, description = "Invalid input or antiforgery token", body = ErrorBody),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No such todo for this user", body = ErrorBody),
    ),
    security(("session" = [], "antiforgery" = []))
)]
#[put("/todos/{id}")]
pub async fn update_todo_by_id(
    user: AuthenticatedUser,
    todos: web::Data<TodoService>,
    id: web::Path<i32>,
    updated_todo: web::Json<UpdateTodo>,
) -> Result<HttpResponse, AppError> {
    let todo = todos
        .update(user.id(), id.into_inner(), updated_todo.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(todo))
}

#[utoipa::path(
    put,
    path = "/api/todos/{id}/toggle",
    tag = "todos",
    params(("id" = i32, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Completion flipped", body = TodoItem),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No such todo for this user", body = ErrorBody),
    ),
    security(("session" = [], "antiforgery" = []))
)]
#[put("/todos/{id}/toggle")]
pub async fn toggle_todo_by_id(
    user: AuthenticatedUser,
    todos: web::Data<TodoService>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let todo = todos.toggle(user.id(), id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(todo))
}

#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    tag = "todos",
    params(("id" = i32, Path, description = "Todo id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No such todo for this user", body = ErrorBody),
    ),
    security(("session" = [], "antiforgery" = []))
)]
#[delete("/todos/{id}")]
pub async fn delete_todo_by_id(
    user: AuthenticatedUser,
    todos: web::Data<TodoService>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    todos.delete(user.id(), id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(get_todos)
            .service(create_todo)
            .service(update_todo_by_id)
            .service(toggle_todo_by_id)
            .service(delete_todo_by_id),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::todo::Priority;
    use crate::test_support::{init_app, sign_up};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    #[actix_web::test]
    async fn todos_require_a_session() {
        let app = init_app().await;
        let req = test::TestRequest::get().uri("/api/todos").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn create_then_list() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;

        let req = session
            .request(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({"title": "Buy milk", "priority": "High"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp.headers().get(header::LOCATION).cloned();
        let created: TodoItem = test::read_body_json(resp).await;
        assert_eq!(created.priority, Priority::High);
        assert_eq!(
            location.as_ref().and_then(|value| value.to_str().ok()),
            Some(format!("/api/todos/{}", created.id).as_str())
        );

        let req = session
            .request(test::TestRequest::get().uri("/api/todos"))
            .to_request();
        let listed: Vec<TodoItem> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Buy milk");
    }

    #[actix_web::test]
    async fn listing_is_served_from_cache_until_a_write() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let list = || {
            session
                .request(test::TestRequest::get().uri("/api/todos"))
                .to_request()
        };

        let first = test::call_service(&app, list()).await;
        assert_eq!(first.headers().get(CACHE_HEADER).unwrap(), "MISS");
        let second = test::call_service(&app, list()).await;
        assert_eq!(second.headers().get(CACHE_HEADER).unwrap(), "HIT");

        let req = session
            .request(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({"title": "Invalidate"}))
            .to_request();
        test::call_service(&app, req).await;

        let third = test::call_service(&app, list()).await;
        assert_eq!(third.headers().get(CACHE_HEADER).unwrap(), "MISS");
        let listed: Vec<TodoItem> = test::read_body_json(third).await;
        assert_eq!(listed.len(), 1);
    }

    #[actix_web::test]
    async fn users_only_see_their_own_todos() {
        let app = init_app().await;
        let ada = sign_up(&app, "ada@example.com").await;
        let bob = sign_up(&app, "bob@example.com").await;

        let req = ada
            .request(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({"title": "Private"}))
            .to_request();
        let created: TodoItem = test::call_and_read_body_json(&app, req).await;

        let req = bob
            .request(test::TestRequest::get().uri("/api/todos"))
            .to_request();
        let listed: Vec<TodoItem> = test::call_and_read_body_json(&app, req).await;
        assert!(listed.is_empty());

        let req = bob
            .request(test::TestRequest::put().uri(&format!("/api/todos/{}/toggle", created.id)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Todo not found");
    }

    #[actix_web::test]
    async fn update_toggle_and_delete() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let req = session
            .request(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({"title": "Draft"}))
            .to_request();
        let created: TodoItem = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/todos/{}", created.id);

        let req = session
            .request(test::TestRequest::put().uri(&uri))
            .set_json(json!({
                "title": "Final",
                "isCompleted": false,
                "priority": "Low",
                "description": "ship it",
                "startAtUtc": "2026-02-01T09:00:00+01:00",
                "endAtUtc": "2026-02-01T10:00:00Z"
            }))
            .to_request();
        let updated: TodoItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description, "ship it");
        assert_eq!(
            updated.start_at_utc.map(|at| at.to_rfc3339()),
            Some("2026-02-01T08:00:00+00:00".to_string())
        );

        let req = session
            .request(test::TestRequest::put().uri(&format!("{uri}/toggle")))
            .to_request();
        let toggled: TodoItem = test::call_and_read_body_json(&app, req).await;
        assert!(toggled.is_completed);

        let req = session
            .request(test::TestRequest::delete().uri(&uri))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = session
            .request(test::TestRequest::delete().uri(&uri))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn invalid_schedules_are_bad_requests() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let req = session
            .request(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({
                "title": "Backwards",
                "startAtUtc": "2026-02-01T10:00:00Z",
                "endAtUtc": "2026-02-01T09:00:00Z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "End must be on or after start.");
    }

    #[actix_web::test]
    async fn overlong_descriptions_are_bad_requests() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let req = session
            .request(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({"title": "Essay", "description": "x".repeat(1001)}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Description must be 1000 characters or fewer.");
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let req = session
            .request(test::TestRequest::post().uri("/api/todos"))
            .insert_header(ContentType::json())
            .set_payload("{\"title\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert!(!body.error.is_empty());
    }

    #[actix_web::test]
    async fn non_numeric_ids_are_json_bad_requests() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        for uri in ["/api/todos/abc/toggle", "/api/todos/99999999999"] {
            let req = session
                .request(test::TestRequest::put().uri(uri))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: ErrorBody = test::read_body_json(resp).await;
            assert!(!body.error.is_empty());
        }
    }

    #[actix_web::test]
    async fn writes_without_the_antiforgery_header_are_rejected() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let req = session
            .request_without_token(test::TestRequest::post().uri("/api/todos"))
            .set_json(json!({"title": "Forged"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Invalid antiforgery token");
    }
}
