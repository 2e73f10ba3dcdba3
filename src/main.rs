use std::sync::Arc;

use actix_cors::Cors;
use actix_web::error::{JsonPayloadError, PathError};
use actix_web::middleware::from_fn;
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer, Responder, Result};
use serde::{Deserialize, Serialize};

use crate::auth::csrf::verify_antiforgery;
use crate::auth::session::load_session;
use crate::auth::AuthSettings;
use crate::cache::OutputCache;
use crate::config::{Config, Environment};
use crate::error::AppError;
use crate::graphql::TodoSchema;
use crate::repository::database::Database;
use crate::repository::memory::MemoryDatabase;
use crate::repository::Store;
use crate::service::{AccountService, TodoService};

mod api;
mod auth;
mod cache;
mod config;
mod error;
mod graphql;
mod models;
mod repository;
mod service;
mod telemetry;
#[cfg(test)]
mod test_support;

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

#[get("/health")]
async fn healthcheck() -> impl Responder {
    let response = Response {
        message: "Everything is working fine".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn not_found() -> Result<HttpResponse> {
    let response = Response {
        message: "Resource not found".to_string(),
    };
    Ok(HttpResponse::NotFound().json(response))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

/// Everything the handlers share, built once and cloned into each worker.
#[derive(Clone)]
pub struct AppState {
    todos: TodoService,
    accounts: AccountService,
    auth: AuthSettings,
    schema: TodoSchema,
    environment: Environment,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let todos = TodoService::new(Arc::clone(&store), OutputCache::new(config.output_cache_ttl));
        Self {
            schema: graphql::build_schema(todos.clone(), config.environment),
            todos,
            accounts: AccountService::new(store),
            auth: AuthSettings::new(
                config.auth_secret.as_deref(),
                config.environment.is_production(),
            ),
            environment: config.environment,
        }
    }
}

pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let environment = state.environment;
        cfg.app_data(web::Data::new(state.todos))
            .app_data(web::Data::new(state.accounts))
            .app_data(web::Data::new(state.auth))
            .app_data(web::Data::new(state.schema))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .service(healthcheck)
            .service(
                web::scope("")
                    .configure(|cfg| api::openapi::config(cfg, environment))
                    .configure(api::api::config)
                    .configure(api::auth::config)
                    .configure(|cfg| graphql::config(cfg, environment))
                    .default_service(web::route().to(not_found))
                    .wrap(from_fn(verify_antiforgery))
                    .wrap(from_fn(load_session)),
            );
    }
}

fn cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allow_any_header()
        .allow_any_method()
        .supports_credentials()
        .max_age(3600)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.database_url.clone() {
        Some(url) => {
            let database = web::block(move || Database::connect(&url))
                .await
                .map_err(|err| anyhow::anyhow!("database connection task failed: {err}"))??;
            tracing::info!("connected to PostgreSQL");
            Ok(Arc::new(database))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, todos and users live in memory only");
            Ok(Arc::new(MemoryDatabase::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(env!("CARGO_PKG_NAME"))?;

    let store = open_store(&config).await?;
    let state = AppState::new(store, &config);
    let cors_origin = config.cors_origin.clone();

    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = ?config.environment,
        "starting server"
    );
    HttpServer::new(move || {
        App::new()
            .configure(configure(state.clone()))
            .wrap(cors(&cors_origin))
            .wrap(actix_web::middleware::Logger::default())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
