// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public catalog routes, proxied to TMDB.

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::extract::{CatalogId, QueryParams};
use crate::services::catalog::{
    page_or_default, CatalogRequest, DiscoverFilters, DiscoverQuery, MovieList, TrendingWindow,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/movies/trending", get(trending))
        .route("/api/movies/popular", get(popular))
        .route("/api/movies/top-rated", get(top_rated))
        .route("/api/movies/upcoming", get(upcoming))
        .route("/api/movies/now-playing", get(now_playing))
        .route("/api/movies/genres", get(genres))
        .route("/api/movies/search", get(search))
        .route("/api/movies/discover", get(discover))
        .route("/api/movies/genre/{id}", get(by_genre))
        .route("/api/movies/{id}", get(movie_details))
        .route("/api/movies/{id}/credits", get(movie_credits))
        .route("/api/movies/{id}/videos", get(movie_videos))
        .route("/api/movies/{id}/similar", get(similar_movies))
        .route("/api/movies/{id}/images", get(movie_images))
        .route("/api/person/{id}", get(person_details))
        .route("/api/person/{id}/movie_credits", get(person_movies))
}

type CatalogJson = Json<serde_json::Value>;

async fn proxy(state: &AppState, request: CatalogRequest) -> Result<CatalogJson> {
    Ok(Json(state.catalog.fetch(&request).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendingParams {
    #[serde(rename = "timeWindow", alias = "time_window")]
    pub time_window: Option<TrendingWindow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: Option<u32>,
}

// ─── Lists ───────────────────────────────────────────────────

async fn trending(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<TrendingParams>,
) -> Result<CatalogJson> {
    let window = params.time_window.unwrap_or_default();
    proxy(&state, CatalogRequest::Trending(window)).await
}

async fn list(state: &AppState, list: MovieList, params: PageParams) -> Result<CatalogJson> {
    let page = page_or_default(params.page)?;
    proxy(state, CatalogRequest::List { list, page }).await
}

async fn popular(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<CatalogJson> {
    list(&state, MovieList::Popular, params).await
}

async fn top_rated(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<CatalogJson> {
    list(&state, MovieList::TopRated, params).await
}

async fn upcoming(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<CatalogJson> {
    list(&state, MovieList::Upcoming, params).await
}

async fn now_playing(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<CatalogJson> {
    list(&state, MovieList::NowPlaying, params).await
}

async fn genres(State(state): State<Arc<AppState>>) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::Genres).await
}

// ─── Search & discovery ──────────────────────────────────────

async fn search(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<CatalogJson> {
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Query is required".to_string()))?;
    let page = page_or_default(params.page)?;
    proxy(&state, CatalogRequest::Search { query, page }).await
}

async fn discover(
    State(state): State<Arc<AppState>>,
    QueryParams(filters): QueryParams<DiscoverFilters>,
) -> Result<CatalogJson> {
    let query = DiscoverQuery::try_from(filters)?;
    proxy(&state, CatalogRequest::Discover(query)).await
}

async fn by_genre(
    State(state): State<Arc<AppState>>,
    CatalogId(genre_id): CatalogId,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<CatalogJson> {
    let page = page_or_default(params.page)?;
    proxy(&state, CatalogRequest::ByGenre { genre_id, page }).await
}

// ─── Movie details ───────────────────────────────────────────

async fn movie_details(
    State(state): State<Arc<AppState>>,
    CatalogId(movie_id): CatalogId,
) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::Movie(movie_id)).await
}

async fn movie_credits(
    State(state): State<Arc<AppState>>,
    CatalogId(movie_id): CatalogId,
) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::Credits(movie_id)).await
}

async fn movie_videos(
    State(state): State<Arc<AppState>>,
    CatalogId(movie_id): CatalogId,
) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::Videos(movie_id)).await
}

async fn similar_movies(
    State(state): State<Arc<AppState>>,
    CatalogId(movie_id): CatalogId,
    QueryParams(params): QueryParams<PageParams>,
) -> Result<CatalogJson> {
    let page = page_or_default(params.page)?;
    proxy(&state, CatalogRequest::Similar { movie_id, page }).await
}

async fn movie_images(
    State(state): State<Arc<AppState>>,
    CatalogId(movie_id): CatalogId,
) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::Images(movie_id)).await
}

// ─── People ──────────────────────────────────────────────────

async fn person_details(
    State(state): State<Arc<AppState>>,
    CatalogId(person_id): CatalogId,
) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::Person(person_id)).await
}

async fn person_movies(
    State(state): State<Arc<AppState>>,
    CatalogId(person_id): CatalogId,
) -> Result<CatalogJson> {
    proxy(&state, CatalogRequest::PersonMovies(person_id)).await
}
