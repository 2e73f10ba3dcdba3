use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::HttpMessage;
use chrono::{DateTime, Utc};

use crate::auth::{auth_settings, AuthSettings};
use crate::error::AppError;

pub const AUTH_COOKIE: &str = "todo_auth";

/// The signed-in user, as recovered from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
}

impl Identity {
    fn encode(&self) -> String {
        format!("{}|{}", self.user_id, self.issued_at.timestamp())
    }

    fn decode(value: &str) -> Option<Self> {
        let (user_id, issued_at) = value.rsplit_once('|')?;
        let issued_at = DateTime::from_timestamp(issued_at.parse().ok()?, 0)?;
        Some(Self {
            user_id: user_id.to_string(),
            issued_at,
        })
    }
}

impl AuthSettings {
    pub fn session_cookie(&self, user_id: &str) -> Result<Cookie<'static>, AppError> {
        let identity = Identity {
            user_id: user_id.to_string(),
            issued_at: Utc::now(),
        };
        let mut cookie = self.cookie(AUTH_COOKIE, identity.encode(), true);
        let lifetime = actix_web::cookie::time::Duration::seconds(self.session_lifetime.num_seconds());
        cookie.set_max_age(lifetime);
        self.seal(cookie)
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.cookie(AUTH_COOKIE, String::new(), true);
        cookie.make_removal();
        cookie
    }

    pub fn read_session(&self, cookie: Cookie<'static>) -> Option<Identity> {
        let identity = Identity::decode(self.open(cookie)?.value())?;
        let age = Utc::now() - identity.issued_at;
        (age < self.session_lifetime).then_some(identity)
    }

    /// Sliding expiration: re-issue once half the lifetime has passed.
    fn needs_renewal(&self, identity: &Identity) -> bool {
        Utc::now() - identity.issued_at > self.session_lifetime / 2
    }
}

/// Resolves the session cookie into an [`Identity`] request extension.
pub async fn load_session(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let settings = auth_settings(&req)?;
    let identity = req
        .cookie(AUTH_COOKIE)
        .and_then(|cookie| settings.read_session(cookie));
    let renewal = identity
        .as_ref()
        .filter(|identity| settings.needs_renewal(identity))
        .map(|identity| identity.user_id.clone());
    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    let mut res = next.call(req).await?;

    if let Some(user_id) = renewal {
        // Sign-in and sign-out set their own cookie.
        let handled = res
            .response()
            .cookies()
            .any(|cookie| cookie.name() == AUTH_COOKIE);
        if !handled {
            let cookie = settings.session_cookie(&user_id)?;
            res.response_mut().add_cookie(&cookie)?;
            tracing::debug!(user_id, "renewed session cookie");
        }
    }
    Ok(res)
}
