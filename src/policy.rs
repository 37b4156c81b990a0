// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Capability checks for review mutation and admin access.

use crate::error::AppError;
use crate::models::{Review, Role, User};

/// Mutations on an existing review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Update,
    Delete,
}

pub fn is_admin(user: &User) -> bool {
    user.role == Role::Admin
}

pub fn is_owner(user: &User, review: &Review) -> bool {
    review.user_id == user.id
}

/// Update is reserved to the author; delete is allowed to the author or an admin.
pub fn authorize(user: &User, action: ReviewAction, review: &Review) -> Result<(), AppError> {
    let allowed = match action {
        ReviewAction::Update => is_owner(user, review),
        ReviewAction::Delete => is_owner(user, review) || is_admin(user),
    };

    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %user.id,
            review_id = %review.id,
            action = ?action,
            "Review action denied"
        );
        Err(AppError::Forbidden("Not authorized".to_string()))
    }
}
