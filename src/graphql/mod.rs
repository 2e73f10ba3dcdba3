use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use async_graphql::http::GraphiQLSource;
use async_graphql::{EmptySubscription, Schema};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::auth::Identity;
use crate::config::Environment;
use crate::service::TodoService;

pub mod error;
pub mod filter;
pub mod mutation;
pub mod query;

use error::ErrorFilter;
use mutation::MutationRoot;
use query::QueryRoot;

const MAX_QUERY_DEPTH: usize = 16;
const MAX_QUERY_COMPLEXITY: usize = 1000;

pub type TodoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(todos: TodoService, environment: Environment) -> TodoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(todos)
        .data(ErrorFilter {
            expose_internal: !environment.is_production(),
        })
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

/// Executes a GraphQL request as the session's user, if any.
pub async fn graphql(
    schema: web::Data<TodoSchema>,
    req: HttpRequest,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    if let Some(identity) = req.extensions().get::<Identity>().cloned() {
        request = request.data(identity);
    }
    schema.execute(request).await.into()
}

pub async fn graphiql() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

pub fn config(cfg: &mut web::ServiceConfig, environment: Environment) {
    let resource = web::resource("/graphql").route(web::post().to(graphql));
    if environment.is_production() {
        cfg.service(resource);
    } else {
        cfg.service(resource.route(web::get().to(graphiql)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::OutputCache;
    use crate::repository::memory::MemoryDatabase;
    use crate::test_support::{init_app, sign_up};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_graphql::Request;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    fn schema() -> TodoSchema {
        let todos = TodoService::new(
            Arc::new(MemoryDatabase::new()),
            OutputCache::new(Duration::from_secs(60)),
        );
        build_schema(todos, Environment::Development)
    }

    fn as_user(query: &str, user_id: &str) -> Request {
        Request::new(query).data(Identity {
            user_id: user_id.to_string(),
            issued_at: Utc::now(),
        })
    }

    async fn run(schema: &TodoSchema, query: &str, user_id: &str) -> Value {
        let response = schema.execute(as_user(query, user_id)).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[actix_web::test]
    async fn resolvers_require_a_user() {
        let response = schema().execute("{ todos { id } }").await;
        assert_eq!(response.errors[0].message, "Unauthorized");
    }

    #[actix_web::test]
    async fn introspection_is_open() {
        let response = schema().execute("{ __schema { queryType { name } } }").await;
        assert!(response.errors.is_empty());
    }

    #[actix_web::test]
    async fn create_filter_and_sort() {
        let schema = schema();
        for (title, priority) in [("Buy milk", "LOW"), ("Call mom", "HIGH"), ("Buy bread", "HIGH")] {
            run(
                &schema,
                &format!(
                    r#"mutation {{ createTodo(input: {{ title: "{title}", priority: {priority} }}) {{ id }} }}"#
                ),
                "alice",
            )
            .await;
        }

        let data = run(
            &schema,
            r#"{ todos(where: { title: { startsWith: "Buy" } }, order: [{ priority: DESC }]) { title priority } }"#,
            "alice",
        )
        .await;
        assert_eq!(
            data,
            json!({ "todos": [
                { "title": "Buy bread", "priority": "HIGH" },
                { "title": "Buy milk", "priority": "LOW" }
            ]})
        );

        let data = run(&schema, "{ todos { id } }", "bob").await;
        assert_eq!(data, json!({ "todos": [] }));
    }

    #[actix_web::test]
    async fn todo_by_id_is_null_for_other_users() {
        let schema = schema();
        let data = run(
            &schema,
            r#"mutation { createTodo(input: { title: "Mine" }) { id } }"#,
            "alice",
        )
        .await;
        let id = data["createTodo"]["id"].as_i64().unwrap();

        let query = format!("{{ todoById(id: {id}) {{ title }} }}");
        assert_eq!(
            run(&schema, &query, "alice").await,
            json!({ "todoById": { "title": "Mine" } })
        );
        assert_eq!(run(&schema, &query, "bob").await, json!({ "todoById": null }));
    }

    #[actix_web::test]
    async fn update_toggle_and_delete() {
        let schema = schema();
        let data = run(
            &schema,
            r#"mutation { createTodo(input: { title: "Draft" }) { id } }"#,
            "alice",
        )
        .await;
        let id = data["createTodo"]["id"].as_i64().unwrap();

        let data = run(
            &schema,
            &format!(
                r#"mutation {{ updateTodo(id: {id}, input: {{
                    title: "Final", isCompleted: false, priority: HIGH,
                    startAtUtc: "2026-02-01T09:00:00Z", endAtUtc: "2026-02-01T10:00:00Z"
                }}) {{ title startAtUtc }} }}"#
            ),
            "alice",
        )
        .await;
        assert_eq!(data["updateTodo"]["title"], "Final");
        assert!(data["updateTodo"]["startAtUtc"].is_string());

        let data = run(
            &schema,
            &format!("mutation {{ toggleTodo(id: {id}) {{ isCompleted }} }}"),
            "alice",
        )
        .await;
        assert_eq!(data, json!({ "toggleTodo": { "isCompleted": true } }));

        let delete = format!("mutation {{ deleteTodo(id: {id}) }}");
        assert_eq!(
            run(&schema, &delete, "alice").await,
            json!({ "deleteTodo": true })
        );
        let response = schema.execute(as_user(&delete, "alice")).await;
        assert_eq!(response.errors[0].message, "Todo not found");
    }

    #[actix_web::test]
    async fn schedule_errors_surface_as_messages() {
        let response = schema()
            .execute(as_user(
                r#"mutation { createTodo(input: { title: "Half", startAtUtc: "2026-02-01T09:00:00Z" }) { id } }"#,
                "alice",
            ))
            .await;
        assert_eq!(response.errors[0].message, "Start and end must both be provided.");
    }

    #[actix_web::test]
    async fn endpoint_uses_the_session_and_skips_antiforgery() {
        let app = init_app().await;
        let session = sign_up(&app, "ada@example.com").await;
        let req = session
            .request_without_token(test::TestRequest::post().uri("/graphql"))
            .set_json(json!({ "query": r#"mutation { createTodo(input: { title: "Via GraphQL" }) { title } }"# }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["createTodo"]["title"], "Via GraphQL");

        let req = session
            .request(test::TestRequest::get().uri("/api/todos"))
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn graphiql_is_served_in_development() {
        let app = init_app().await;
        let req = test::TestRequest::get().uri("/graphql").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
