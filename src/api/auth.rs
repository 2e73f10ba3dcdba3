use actix_web::{get, post, web, HttpResponse};

use crate::auth::csrf::generate_token;
use crate::auth::{AuthSettings, AuthenticatedUser};
use crate::error::{AppError, ErrorBody};
use crate::models::user::{LoginRequest, RegisterRequest, User, UserResponse};
use crate::service::AccountService;

fn signed_in(settings: &AuthSettings, user: &User) -> Result<HttpResponse, AppError> {
    let cookie = settings.session_cookie(&user.id)?;
    Ok(HttpResponse::Ok().cookie(cookie).json(UserResponse::from(user)))
}

/// Issues a fresh antiforgery token pair.
#[utoipa::path(
    get,
    path = "/auth/csrf",
    tag = "auth",
    responses((status = 204, description = "Antiforgery cookies set"))
)]
#[get("/csrf")]
pub async fn csrf(settings: web::Data<AuthSettings>) -> Result<HttpResponse, AppError> {
    let (reference, request_token) = settings.antiforgery_cookies(&generate_token())?;
    Ok(HttpResponse::NoContent()
        .cookie(reference)
        .cookie(request_token)
        .finish())
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and signed in", body = UserResponse),
        (status = 400, description = "Every failed registration rule", body = [String]),
    ),
    security(("antiforgery" = []))
)]
#[post("/register")]
pub async fn register(
    accounts: web::Data<AccountService>,
    settings: web::Data<AuthSettings>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.register(request.into_inner()).await?;
    signed_in(&settings, &user)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserResponse),
        (status = 400, description = "Invalid credentials", body = ErrorBody),
    ),
    security(("antiforgery" = []))
)]
#[post("/login")]
pub async fn login(
    accounts: web::Data<AccountService>,
    settings: web::Data<AuthSettings>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.authenticate(request.into_inner()).await?;
    tracing::info!(user_id = %user.id, "signed in");
    signed_in(&settings, &user)
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Session cookie cleared"),
        (status = 401, description = "No valid session"),
    ),
    security(("session" = [], "antiforgery" = []))
)]
#[post("/logout")]
pub async fn logout(
    user: AuthenticatedUser,
    settings: web::Data<AuthSettings>,
) -> HttpResponse {
    tracing::info!(user_id = user.id(), "signed out");
    HttpResponse::NoContent()
        .cookie(settings.removal_cookie())
        .finish()
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "The signed-in user", body = UserResponse),
        (status = 401, description = "No valid session"),
    ),
    security(("session" = []))
)]
#[get("/me")]
pub async fn me(
    user: AuthenticatedUser,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    // A valid cookie can outlive its account.
    let user = accounts
        .find(user.id())
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(csrf)
            .service(register)
            .service(login)
            .service(logout)
            .service(me),
    );
}
