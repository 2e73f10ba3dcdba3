use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::models::schedule::ScheduleError;
use crate::repository::RepositoryError;

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    /// Several independent validation failures, reported together.
    #[error("{}", .0.join(" "))]
    Rejected(Vec<String>),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Todo not found")]
    TodoNotFound,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid antiforgery token")]
    Antiforgery,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Errors whose message must not reach clients outside development.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Internal(_)
                | AppError::Repository(RepositoryError::Pool(_))
                | AppError::Repository(RepositoryError::Query(_))
                | AppError::Repository(RepositoryError::Migration(_))
        )
    }

    pub fn client_message(&self) -> String {
        match self {
            AppError::Repository(RepositoryError::Conflict(_)) => "Record already exists.".to_string(),
            AppError::Repository(RepositoryError::Constraint(_)) => {
                "Request violates a data constraint.".to_string()
            }
            err if err.is_internal() => INTERNAL_ERROR_MESSAGE.to_string(),
            err => err.to_string(),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Messages of failed field rules, ordered by field name.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));
    fields
        .into_iter()
        .flat_map(|(_, errors)| errors.iter())
        .map(|error| match &error.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value ({}).", error.code),
        })
        .collect()
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(validation_messages(&errors).join(" "))
    }
}

impl From<BlockingError> for AppError {
    fn from(err: BlockingError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Rejected(_)
            | AppError::InvalidCredentials
            | AppError::Antiforgery
            | AppError::Repository(RepositoryError::Constraint(_)) => StatusCode::BAD_REQUEST,
            AppError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::TodoNotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Repository(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            tracing::error!(error = %self, "request failed");
        }
        let mut response = HttpResponse::build(self.status_code());
        match self {
            AppError::Rejected(messages) => response.json(messages),
            err => response.json(ErrorBody {
                error: err.client_message(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn maps_errors_to_statuses() {
        assert_eq!(AppError::TodoNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(ScheduleError::Incomplete).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Repository(RepositoryError::Pool("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[derive(validator::Validate)]
    struct Profile {
        #[validate(length(max = 3, message = "Nickname is too long."))]
        nickname: String,
        #[validate(length(min = 1, message = "Bio is required."))]
        bio: String,
    }

    #[test]
    fn failed_field_rules_become_bad_requests() {
        use validator::Validate;

        let profile = Profile {
            nickname: "abcd".to_string(),
            bio: String::new(),
        };
        let err = profile.validate().unwrap_err();
        assert_eq!(
            validation_messages(&err),
            vec!["Bio is required.", "Nickname is too long."]
        );
        let err = AppError::from(err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Bio is required. Nickname is too long.");
    }

    #[actix_web::test]
    async fn hides_internal_details() {
        let response =
            AppError::Repository(RepositoryError::Query("relation missing".into())).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, INTERNAL_ERROR_MESSAGE);
    }

    #[actix_web::test]
    async fn rejected_errors_are_a_list() {
        let response =
            AppError::Rejected(vec!["one".to_string(), "two".to_string()]).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, vec!["one", "two"]);
    }
}
