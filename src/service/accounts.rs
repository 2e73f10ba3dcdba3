use std::sync::Arc;

use actix_web::web;
use chrono::Utc;
use validator::{Validate, ValidateEmail};

use crate::auth::password;
use crate::error::{validation_messages, AppError};
use crate::models::user::{normalize_email, LoginRequest, NewUser, RegisterRequest, User};
use crate::repository::{RepositoryError, Store};
use crate::service::blocking;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn find(&self, id: &str) -> Result<Option<User>, AppError> {
        let id = id.to_string();
        blocking(&self.store, move |store| store.find_user_by_id(&id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let normalized = normalize_email(email);
        blocking(&self.store, move |store| store.find_user_by_email(&normalized)).await
    }

    /// Creates an account; every failed rule is reported at once.
    pub async fn register(&self, mut request: RegisterRequest) -> Result<User, AppError> {
        request.email = request.email.trim().to_string();
        request.first_name = non_empty(request.first_name.take());
        request.last_name = non_empty(request.last_name.take());
        let email = request.email.clone();
        let taken = || AppError::Rejected(vec![format!("Email '{email}' is already taken.")]);

        let mut errors = Vec::new();
        if !email.validate_email() {
            errors.push(format!("Email '{email}' is invalid."));
        }
        if let Err(invalid) = request.validate() {
            errors.extend(validation_messages(&invalid));
        }
        if errors.is_empty() && self.find_by_email(&email).await?.is_some() {
            errors.push(format!("Email '{email}' is already taken."));
        }
        errors.extend(password::policy_violations(&request.password));
        if !errors.is_empty() {
            return Err(AppError::Rejected(errors));
        }

        let secret = request.password;
        let password_hash = web::block(move || password::hash_password(&secret)).await??;
        let new_user = NewUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            normalized_email: normalize_email(&email),
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
            created_at: Utc::now(),
        };
        match blocking(&self.store, move |store| store.insert_user(new_user)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "registered user");
                Ok(user)
            }
            Err(AppError::Repository(RepositoryError::Conflict(_))) => Err(taken()),
            Err(err) => Err(err),
        }
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AppError> {
        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        let hash = user.password_hash.clone();
        let secret = request.password;
        let verified = web::block(move || password::verify_password(&secret, &hash)).await??;
        if !verified {
            tracing::info!(user_id = %user.id, "rejected sign-in with a wrong password");
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }
}
