// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user collection routes (favorites, watchlist, recently viewed).
//! The auth middleware is applied in routes/mod.rs for these routes.

use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::extract::CatalogId;
use crate::middleware::auth::CurrentUser;
use crate::models::{CollectionKind, MovieId, MovieStatus};
use crate::services::collections::{resolve_movies, CollectionRepository, RECENT_LISTING_LEN};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/favorites", get(list_favorites))
        .route("/api/users/favorites/{id}", put(toggle_favorite))
        .route("/api/users/watchlist", get(list_watchlist))
        .route("/api/users/watchlist/{id}", put(toggle_watchlist))
        .route("/api/users/recently-viewed", get(list_recently_viewed))
        .route("/api/users/recently-viewed/{id}", put(record_view))
        .route("/api/users/check/{id}", get(check_movie))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggleResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub favorites: Vec<MovieId>,
    pub is_favorite: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistToggleResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub watchlist: Vec<MovieId>,
    pub in_watchlist: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyViewedResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub recently_viewed: Vec<MovieId>,
}

// ─── Listings ────────────────────────────────────────────────

async fn list_collection(
    state: &AppState,
    user: &CurrentUser,
    kind: CollectionKind,
) -> Result<Json<Vec<serde_json::Value>>> {
    let ids = state.collections_for(user.0.id).list(kind).await?;
    Ok(Json(resolve_movies(state.catalog.as_ref(), &ids).await))
}

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<serde_json::Value>>> {
    list_collection(&state, &user, CollectionKind::Favorites).await
}

async fn list_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<serde_json::Value>>> {
    list_collection(&state, &user, CollectionKind::Watchlist).await
}

async fn list_recently_viewed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<serde_json::Value>>> {
    let mut ids = state.collections_for(user.0.id).recently_viewed().await?;
    ids.truncate(RECENT_LISTING_LEN);
    Ok(Json(resolve_movies(state.catalog.as_ref(), &ids).await))
}

// ─── Mutations ───────────────────────────────────────────────

async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    CatalogId(movie_id): CatalogId,
) -> Result<Json<FavoriteToggleResponse>> {
    let outcome = state
        .collections_for(user.0.id)
        .toggle(CollectionKind::Favorites, movie_id)
        .await?;
    Ok(Json(FavoriteToggleResponse {
        favorites: outcome.ids,
        is_favorite: outcome.member,
    }))
}

async fn toggle_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    CatalogId(movie_id): CatalogId,
) -> Result<Json<WatchlistToggleResponse>> {
    let outcome = state
        .collections_for(user.0.id)
        .toggle(CollectionKind::Watchlist, movie_id)
        .await?;
    Ok(Json(WatchlistToggleResponse {
        watchlist: outcome.ids,
        in_watchlist: outcome.member,
    }))
}

async fn record_view(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    CatalogId(movie_id): CatalogId,
) -> Result<Json<RecentlyViewedResponse>> {
    let recently_viewed = state.collections_for(user.0.id).record_view(movie_id).await?;
    Ok(Json(RecentlyViewedResponse { recently_viewed }))
}

/// Membership check; reads the user resolved for this request.
async fn check_movie(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    CatalogId(movie_id): CatalogId,
) -> Json<MovieStatus> {
    Json(user.status_of(movie_id))
}
