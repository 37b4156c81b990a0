// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes. `require_auth` and `require_admin` are applied in routes/mod.rs.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::Page;
use crate::error::{AppError, Result};
use crate::extract::{QueryParams, RecordId, ValidatedJson};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    FeaturedMovie, FeaturedMovieUpdate, NewFeaturedMovie, ReviewWithReviewer, Role, User,
};
use crate::routes::reviews::MessageResponse;
use crate::AppState;

/// Entries shown in each "recent" panel of the dashboard.
const DASHBOARD_RECENT: u64 = 5;
const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", put(set_role))
        .route("/api/admin/users/{id}", delete(delete_user))
        .route("/api/admin/reviews", get(list_reviews))
        .route("/api/admin/reviews/{id}", delete(delete_review))
        .route("/api/admin/movies", get(list_featured).post(create_featured))
        .route(
            "/api/admin/movies/{id}",
            put(update_featured).delete(delete_featured),
        )
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

// ─── Pagination ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ListParams {
    /// Returns (page number, page size, store window).
    fn window(&self) -> Result<(u64, u64, Page)> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }
        // Stores take the offset as a signed 64-bit value
        let offset = (page - 1)
            .checked_mul(per_page)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;
        Ok((
            page,
            per_page,
            Page {
                offset,
                limit: per_page,
            },
        ))
    }
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_users: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_reviews: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_featured_movies: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardCounts,
    pub recent_users: Vec<User>,
    pub recent_reviews: Vec<ReviewWithReviewer>,
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<DashboardResponse>> {
    let counts = state.store.counts().await?;
    let recent_users = state
        .store
        .list_users(Page::first(DASHBOARD_RECENT))
        .await?;
    let recent_reviews = state
        .store
        .list_reviews(Page::first(DASHBOARD_RECENT))
        .await?;

    Ok(Json(DashboardResponse {
        stats: DashboardCounts {
            total_users: counts.users,
            total_reviews: counts.reviews,
            total_featured_movies: counts.featured_movies,
        },
        recent_users,
        recent_reviews,
    }))
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<User>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub page: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub per_page: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<UserListResponse>> {
    let (page, per_page, window) = params.window()?;
    let users = state.store.list_users(window).await?;
    let total = state.store.counts().await?.users;

    Ok(Json(UserListResponse {
        users,
        page,
        per_page,
        total,
    }))
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct RoleRequest {
    pub role: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoleResponse {
    pub message: String,
    pub user: User,
}

async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    RecordId(user_id): RecordId,
    ValidatedJson(request): ValidatedJson<RoleRequest>,
) -> Result<Json<RoleResponse>> {
    let role: Role = request
        .role
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("role must be 'user' or 'admin'".to_string()))?;

    let user = state
        .store
        .set_role(user_id, role)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    tracing::info!(admin_id = %admin.id, %user_id, role = %role, "User role updated");
    Ok(Json(RoleResponse {
        message: "User role updated".to_string(),
        user,
    }))
}

/// Delete a user together with their reviews and collections.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    RecordId(user_id): RecordId,
) -> Result<Json<MessageResponse>> {
    if !state.store.delete_user(user_id).await? {
        return Err(AppError::not_found("User"));
    }
    tracing::info!(admin_id = %admin.id, %user_id, "User deleted");
    Ok(message("User deleted"))
}

// ─── Reviews ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewWithReviewer>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub page: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub per_page: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
}

async fn list_reviews(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<ReviewListResponse>> {
    let (page, per_page, window) = params.window()?;
    let reviews = state.store.list_reviews(window).await?;
    let total = state.store.counts().await?.reviews;

    Ok(Json(ReviewListResponse {
        reviews,
        page,
        per_page,
        total,
    }))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    RecordId(review_id): RecordId,
) -> Result<Json<MessageResponse>> {
    state.reviews.delete(&admin, review_id).await?;
    Ok(message("Review deleted"))
}

// ─── Featured movies ─────────────────────────────────────────

async fn list_featured(State(state): State<Arc<AppState>>) -> Result<Json<Vec<FeaturedMovie>>> {
    Ok(Json(state.store.list_featured().await?))
}

async fn create_featured(
    State(state): State<Arc<AppState>>,
    ValidatedJson(movie): ValidatedJson<NewFeaturedMovie>,
) -> Result<(StatusCode, Json<FeaturedMovie>)> {
    let movie = state.store.create_featured(movie).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn update_featured(
    State(state): State<Arc<AppState>>,
    RecordId(id): RecordId,
    ValidatedJson(update): ValidatedJson<FeaturedMovieUpdate>,
) -> Result<Json<FeaturedMovie>> {
    state
        .store
        .update_featured(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Movie"))
}

async fn delete_featured(
    State(state): State<Arc<AppState>>,
    RecordId(id): RecordId,
) -> Result<Json<MessageResponse>> {
    if !state.store.delete_featured(id).await? {
        return Err(AppError::not_found("Movie"));
    }
    Ok(message("Movie deleted"))
}
