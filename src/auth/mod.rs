use std::future::{ready, Ready};

use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};

use crate::error::AppError;

pub mod csrf;
pub mod password;
pub mod session;

pub use session::Identity;

/// Cookie crypto and policy shared by the session and antiforgery layers.
#[derive(Clone)]
pub struct AuthSettings {
    key: Key,
    secure: bool,
    session_lifetime: chrono::Duration,
}

impl AuthSettings {
    pub fn new(secret: Option<&str>, secure: bool) -> Self {
        let key = match secret {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => {
                tracing::warn!("AUTH_SECRET is not set, sessions will not survive a restart");
                Key::generate()
            }
        };
        Self {
            key,
            secure,
            session_lifetime: chrono::Duration::days(7),
        }
    }

    fn cookie(&self, name: &'static str, value: String, http_only: bool) -> Cookie<'static> {
        Cookie::build(name, value)
            .path("/")
            .http_only(http_only)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish()
    }

    /// Encrypts and authenticates the cookie value.
    fn seal(&self, cookie: Cookie<'static>) -> Result<Cookie<'static>, AppError> {
        let name = cookie.name().to_string();
        let mut jar = CookieJar::new();
        jar.private_mut(&self.key).add(cookie);
        jar.get(&name)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("failed to seal cookie {name}")))
    }

    /// `None` when the cookie was tampered with or sealed under another key.
    fn open(&self, cookie: Cookie<'static>) -> Option<Cookie<'static>> {
        let jar = CookieJar::new();
        jar.private(&self.key).decrypt(cookie)
    }
}

fn auth_settings(req: &ServiceRequest) -> Result<web::Data<AuthSettings>, AppError> {
    req.app_data::<web::Data<AuthSettings>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("auth settings are not registered".to_string()))
}

/// Extractor for handlers that require a signed-in user; rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    pub fn id(&self) -> &str {
        &self.0.user_id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().cloned();
        ready(identity.map(AuthenticatedUser).ok_or(AppError::Unauthorized))
    }
}
