use chrono::{DateTime, Utc};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::repository::schema::users;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: String,
    pub email: String,
    pub normalized_email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Column widths match the `users` table.
#[derive(Debug, Clone, Insertable, Validate)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    #[validate(length(max = 256))]
    pub email: String,
    #[validate(length(max = 256))]
    pub normalized_email: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<NewUser> for User {
    fn from(value: NewUser) -> Self {
        Self {
            id: value.id,
            email: value.email,
            normalized_email: value.normalized_email,
            first_name: value.first_name,
            last_name: value.last_name,
            password_hash: value.password_hash,
            created_at: value.created_at,
        }
    }
}

/// Lookup key for emails; matching is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_uppercase()
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(max = 256, message = "Email must be 256 characters or fewer."))]
    pub email: String,
    pub password: String,
    #[validate(length(max = 100, message = "First name must be 100 characters or fewer."))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must be 100 characters or fewer."))]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(value: &User) -> Self {
        Self {
            id: value.id.clone(),
            email: value.email.clone(),
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
        }
    }
}
