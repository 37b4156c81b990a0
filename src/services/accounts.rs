// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login and profile updates.

use crate::db::AccountStore;
use crate::error::AppError;
use crate::middleware::auth::create_jwt;
use crate::models::{NewUser, ProfileChanges, Role, User};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Please provide a name"))]
    pub name: String,
    /// Checked after trimming and lower-casing, see `checked_email`.
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Please provide an email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide a password"))]
    pub password: String,
}

/// Profile update body. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
}

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize an email, then require it to be well formed.
fn checked_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if !validator::ValidateEmail::validate_email(&email) {
        return Err(AppError::Validation(
            "email: Please provide a valid email".to_string(),
        ));
    }
    Ok(email)
}

/// Treat empty strings the same as absent fields.
fn supplied(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Account operations over the account store.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    signing_key: Arc<[u8]>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, signing_key: &[u8], bcrypt_cost: u32) -> Self {
        Self {
            store,
            signing_key: Arc::from(signing_key),
            bcrypt_cost,
        }
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AppError> {
        Ok(create_jwt(user_id, &self.signing_key)?)
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("password hashing task failed")?
            .context("password hashing failed")?;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("password verification task failed")?;
        // A malformed stored hash can never match
        Ok(matches.unwrap_or(false))
    }

    /// Create an account with role `user` and empty collections.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, AppError> {
        request.validate()?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("name: Please provide a name".to_string()));
        }
        let email = checked_email(&request.email)?;

        // Cheap pre-check; the store's unique email is the real guard
        if self.store.find_credentials(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                name,
                email,
                password_hash,
                role: Role::User,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Registered new user");
        let token = self.issue_token(user.id)?;
        Ok(Session { user, token })
    }

    /// Verify credentials. Unknown email and wrong password are indistinguishable.
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AppError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let Some(credentials) = self.store.find_credentials(&email).await? else {
            tracing::debug!("Login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .verify_password(request.password, credentials.password_hash)
            .await?
        {
            tracing::warn!(user_id = %credentials.user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(credentials.user.id)?;
        Ok(Session {
            user: credentials.user,
            token,
        })
    }

    /// Apply a profile update and issue a new token.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: ProfileUpdateRequest,
    ) -> Result<Session, AppError> {
        request.validate()?;

        let email = supplied(request.email)
            .map(|raw| checked_email(&raw))
            .transpose()?;

        let password_hash = match request.password.filter(|p| !p.is_empty()) {
            Some(password) if password.chars().count() < 6 => {
                return Err(AppError::Validation(
                    "password: Password must be at least 6 characters".to_string(),
                ))
            }
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        let changes = ProfileChanges {
            name: supplied(request.name),
            email,
            avatar: supplied(request.avatar),
            password_hash,
        };

        let user = self
            .store
            .update_profile(user_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let token = self.issue_token(user.id)?;
        Ok(Session { user, token })
    }
}
