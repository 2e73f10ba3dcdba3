use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::Components;
use utoipa::{Modify, OpenApi};

use crate::auth::csrf::REQUEST_TOKEN_HEADER;
use crate::auth::session::AUTH_COOKIE;
use crate::config::Environment;
use crate::error::ErrorBody;
use crate::models::todo::{CreateTodo, Priority, TodoItem, UpdateTodo};
use crate::models::user::{LoginRequest, RegisterRequest, UserResponse};

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/swagger";

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Todo API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "{spec_url}", dom_id: "#swagger-ui", withCredentials: true });
    };
  </script>
</body>
</html>
"##;

/// REST surface of the service. GraphQL documents itself through introspection.
#[derive(OpenApi)]
#[openapi(
    info(title = "Todo API", description = "Multi-user todo lists over REST and GraphQL."),
    paths(
        crate::api::api::get_todos,
        crate::api::api::create_todo,
        crate::api::api::update_todo_by_id,
        crate::api::api::toggle_todo_by_id,
        crate::api::api::delete_todo_by_id,
        crate::api::auth::csrf,
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::me,
    ),
    components(schemas(
        TodoItem,
        Priority,
        CreateTodo,
        UpdateTodo,
        RegisterRequest,
        LoginRequest,
        UserResponse,
        ErrorBody,
    )),
    modifiers(&SessionSecurity),
    tags(
        (name = "todos", description = "The signed-in user's todos"),
        (name = "auth", description = "Registration, sign-in and antiforgery tokens"),
    )
)]
pub struct ApiDoc;

/// The session cookie, plus the header that must echo the antiforgery token on writes.
struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Components::new);
        components.add_security_scheme(
            "session",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
        );
        components.add_security_scheme(
            "antiforgery",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(REQUEST_TOKEN_HEADER))),
        );
    }
}

pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub async fn swagger_ui() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(SWAGGER_UI.replace("{spec_url}", OPENAPI_PATH))
}

/// Documentation routes exist in development only.
pub fn config(cfg: &mut web::ServiceConfig, environment: Environment) {
    if environment.is_production() {
        return;
    }
    cfg.route(OPENAPI_PATH, web::get().to(openapi_json))
        .route(SWAGGER_UI_PATH, web::get().to(swagger_ui));
}
