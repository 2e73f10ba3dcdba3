//! Helpers for driving the full app in tests: a browser-like cookie jar that
//! also echoes the antiforgery token.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::App;
use serde_json::json;

use crate::auth::csrf::{REQUEST_TOKEN_COOKIE, REQUEST_TOKEN_HEADER};
use crate::config::Config;
use crate::repository::memory::MemoryDatabase;
use crate::{configure, AppState};

pub const PASSWORD: &str = "Secret123!";

pub fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryDatabase::new()), &Config::for_tests())
}

pub async fn init_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(App::new().configure(configure(test_state()))).await
}

#[derive(Debug, Default, Clone)]
pub struct Session {
    cookies: Vec<Cookie<'static>>,
    token: String,
}

impl Session {
    /// Applies `Set-Cookie` headers the way a browser would.
    pub fn absorb<B>(&mut self, resp: &ServiceResponse<B>) {
        for cookie in resp.response().cookies() {
            self.cookies.retain(|kept| kept.name() != cookie.name());
            if cookie.value().is_empty() {
                continue;
            }
            if cookie.name() == REQUEST_TOKEN_COOKIE {
                self.token = cookie.value().to_string();
            }
            self.cookies.push(cookie.into_owned());
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|cookie| cookie.name() == name)
    }

    pub fn request_without_token(&self, req: TestRequest) -> TestRequest {
        self.cookies
            .iter()
            .fold(req, |req, cookie| req.cookie(cookie.clone()))
    }

    pub fn request(&self, req: TestRequest) -> TestRequest {
        self.request_without_token(req)
            .insert_header((REQUEST_TOKEN_HEADER, self.token.clone()))
    }
}

pub async fn anonymous_session<S, B>(app: &S) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = TestRequest::get().uri("/auth/csrf").to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let mut session = Session::default();
    session.absorb(&resp);
    session
}

pub async fn sign_up<S, B>(app: &S, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut session = anonymous_session(app).await;
    let req = session
        .request(TestRequest::post().uri("/auth/register"))
        .set_json(json!({
            "email": email,
            "password": PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    session.absorb(&resp);
    session
}
