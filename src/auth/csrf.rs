use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::middleware::Next;
use actix_web::{HttpMessage, ResponseError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::auth::{auth_settings, AuthSettings};
use crate::error::AppError;

/// HttpOnly cookie holding the sealed reference token.
pub const ANTIFORGERY_COOKIE: &str = "todo_antiforgery";
/// Script-readable copy the client echoes back in [`REQUEST_TOKEN_HEADER`].
pub const REQUEST_TOKEN_COOKIE: &str = "XSRF-TOKEN";
pub const REQUEST_TOKEN_HEADER: &str = "X-XSRF-TOKEN";

const EXEMPT_PATHS: [&str; 2] = ["/auth/csrf", "/graphql"];

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl AuthSettings {
    /// The sealed reference cookie and the plain request-token cookie.
    pub fn antiforgery_cookies(
        &self,
        token: &str,
    ) -> Result<(Cookie<'static>, Cookie<'static>), AppError> {
        let reference = self.seal(self.cookie(ANTIFORGERY_COOKIE, token.to_string(), true))?;
        let request_token = self.cookie(REQUEST_TOKEN_COOKIE, token.to_string(), false);
        Ok((reference, request_token))
    }
}

fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn requires_token(method: &Method, path: &str) -> bool {
    let state_changing = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method);
    state_changing && !EXEMPT_PATHS.iter().any(|prefix| has_segment_prefix(path, prefix))
}

fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Rejects state-changing requests whose header token does not match the
/// sealed antiforgery cookie.
pub async fn verify_antiforgery(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    if requires_token(req.method(), req.path()) {
        let settings = auth_settings(&req)?;
        let expected = req
            .cookie(ANTIFORGERY_COOKIE)
            .and_then(|cookie| settings.open(cookie))
            .map(|cookie| cookie.value().to_string());
        let presented = req
            .headers()
            .get(REQUEST_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        let valid = match (expected.as_deref(), presented) {
            (Some(expected), Some(presented)) => tokens_match(expected, presented),
            _ => false,
        };
        if !valid {
            tracing::warn!(method = %req.method(), path = req.path(), "antiforgery validation failed");
            let response = AppError::Antiforgery.error_response();
            return Ok(req.into_response(response).map_into_right_body());
        }
    }
    Ok(next.call(req).await?.map_into_left_body())
}
