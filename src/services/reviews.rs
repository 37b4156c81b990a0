// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Movie reviews: one per (user, movie), owner-mutable, owner-or-admin deletable.

use crate::db::AccountStore;
use crate::error::AppError;
use crate::models::review::{MAX_COMMENT_CHARS, MAX_RATING, MIN_RATING};
use crate::models::{MovieId, NewReview, ReviewUpdate, ReviewWithReviewer, User};
use crate::policy::{self, ReviewAction};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, message = "must be a positive catalog id"))]
    pub movie_id: MovieId,
    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

/// Trim a comment and check it is non-empty and within the length limit.
pub fn normalize_comment(raw: &str) -> Result<String, AppError> {
    let comment = raw.trim();
    if comment.is_empty() {
        return Err(AppError::Validation("Comment is required".to_string()));
    }
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(comment.to_string())
}

fn check_rating(rating: u8) -> Result<u8, AppError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(AppError::Validation(
            "Rating must be between 1 and 10".to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn AccountStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Reviews of a movie, newest first. With a viewer, each review carries `is_own`.
    pub async fn for_movie(
        &self,
        movie_id: MovieId,
        viewer: Option<&User>,
    ) -> Result<Vec<ReviewWithReviewer>, AppError> {
        let mut reviews = self.store.reviews_for_movie(movie_id).await?;
        if let Some(viewer) = viewer {
            for review in &mut reviews {
                review.is_own = Some(review.review.user_id == viewer.id);
            }
        }
        Ok(reviews)
    }

    pub async fn by_user(&self, user: &User) -> Result<Vec<ReviewWithReviewer>, AppError> {
        self.store.reviews_by_user(user.id).await
    }

    /// Create a review. A second review of the same movie by the same user
    /// fails with `DuplicateReview`, also under concurrent submission.
    pub async fn create(
        &self,
        author: &User,
        request: CreateReviewRequest,
    ) -> Result<ReviewWithReviewer, AppError> {
        request.validate()?;
        let review = NewReview {
            user_id: author.id,
            movie_id: request.movie_id,
            rating: check_rating(request.rating)?,
            comment: normalize_comment(&request.comment)?,
        };

        let created = self.store.create_review(review).await?;
        tracing::info!(
            review_id = %created.review.id,
            user_id = %author.id,
            movie_id = created.review.movie_id,
            "Review created"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &User,
        review_id: Uuid,
        request: UpdateReviewRequest,
    ) -> Result<ReviewWithReviewer, AppError> {
        request.validate()?;
        let update = ReviewUpdate {
            rating: request.rating.map(check_rating).transpose()?,
            comment: request
                .comment
                .as_deref()
                .map(normalize_comment)
                .transpose()?,
        };
        if update.is_empty() {
            return Err(AppError::Validation(
                "Provide a rating or a comment to update".to_string(),
            ));
        }

        let existing = self
            .store
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::not_found("Review"))?;
        policy::authorize(actor, ReviewAction::Update, &existing)?;

        self.store
            .update_review(review_id, update)
            .await?
            .ok_or_else(|| AppError::not_found("Review"))
    }

    pub async fn delete(&self, actor: &User, review_id: Uuid) -> Result<(), AppError> {
        let existing = self
            .store
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::not_found("Review"))?;
        policy::authorize(actor, ReviewAction::Delete, &existing)?;

        if !self.store.delete_review(review_id).await? {
            return Err(AppError::not_found("Review"));
        }
        tracing::info!(%review_id, actor = %actor.id, "Review deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment("  Great film \n").unwrap(), "Great film");
        assert!(normalize_comment("   ").is_err());
        assert!(normalize_comment(&"a".repeat(MAX_COMMENT_CHARS)).is_ok());
        assert!(normalize_comment(&"a".repeat(MAX_COMMENT_CHARS + 1)).is_err());
        // Limit counts characters, not bytes
        assert!(normalize_comment(&"é".repeat(MAX_COMMENT_CHARS)).is_ok());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(check_rating(0).is_err());
        assert!(check_rating(1).is_ok());
        assert!(check_rating(10).is_ok());
        assert!(check_rating(11).is_err());
    }
}
