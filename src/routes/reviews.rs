// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Review routes.
//!
//! `GET /api/reviews/{id}` takes a movie id; `PUT`/`DELETE` on the same path
//! take a review id. The two share one path so their routers merge.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::extract::{CatalogId, RecordId, ValidatedJson};
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::models::ReviewWithReviewer;
use crate::services::reviews::{CreateReviewRequest, UpdateReviewRequest};
use crate::AppState;

/// Routes behind `optional_auth`.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/reviews/{id}", get(movie_reviews))
}

/// Routes behind `require_auth`.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reviews", post(create_review))
        .route("/api/reviews/user/my-reviews", get(my_reviews))
        .route("/api/reviews/{id}", put(update_review).delete(delete_review))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

/// Reviews of one movie, newest first; `isOwn` is set when a session is presented.
async fn movie_reviews(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<MaybeUser>,
    CatalogId(movie_id): CatalogId,
) -> Result<Json<Vec<ReviewWithReviewer>>> {
    let reviews = state.reviews.for_movie(movie_id, viewer.0.as_ref()).await?;
    Ok(Json(reviews))
}

async fn my_reviews(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<ReviewWithReviewer>>> {
    Ok(Json(state.reviews.by_user(&user).await?))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewWithReviewer>)> {
    let review = state.reviews.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    RecordId(review_id): RecordId,
    ValidatedJson(request): ValidatedJson<UpdateReviewRequest>,
) -> Result<Json<ReviewWithReviewer>> {
    Ok(Json(state.reviews.update(&user, review_id, request).await?))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    RecordId(review_id): RecordId,
) -> Result<Json<MessageResponse>> {
    state.reviews.delete(&user, review_id).await?;
    Ok(Json(MessageResponse {
        message: "Review deleted".to_string(),
    }))
}
