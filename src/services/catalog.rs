// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Movie catalog proxy (TMDB v3).
//!
//! Requests are described by `CatalogRequest`, validated before they leave
//! the process, and forwarded to the provider with the API key attached.
//! Response bodies are passed through untouched.

use crate::error::AppError;
use crate::models::MovieId;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// TMDB refuses pages above 500.
pub const MAX_PAGE: u32 = 500;

/// Read-only access to the external movie catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Perform one catalog request and return the provider's JSON body.
    async fn fetch(&self, request: &CatalogRequest) -> Result<serde_json::Value, AppError>;
}

// ─── Requests ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    #[default]
    Week,
}

impl TrendingWindow {
    fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

/// Curated paged movie lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieList {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl MovieList {
    fn segment(&self) -> &'static str {
        match self {
            MovieList::Popular => "popular",
            MovieList::TopRated => "top_rated",
            MovieList::Upcoming => "upcoming",
            MovieList::NowPlaying => "now_playing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRequest {
    Trending(TrendingWindow),
    List { list: MovieList, page: u32 },
    Genres,
    Search { query: String, page: u32 },
    Discover(DiscoverQuery),
    ByGenre { genre_id: i64, page: u32 },
    Movie(MovieId),
    Credits(MovieId),
    Videos(MovieId),
    Similar { movie_id: MovieId, page: u32 },
    Images(MovieId),
    Person(i64),
    PersonMovies(i64),
}

impl CatalogRequest {
    /// Path below the provider base URL.
    pub fn path(&self) -> String {
        match self {
            CatalogRequest::Trending(window) => format!("/trending/movie/{}", window.as_str()),
            CatalogRequest::List { list, .. } => format!("/movie/{}", list.segment()),
            CatalogRequest::Genres => "/genre/movie/list".to_string(),
            CatalogRequest::Search { .. } => "/search/movie".to_string(),
            CatalogRequest::Discover(_) | CatalogRequest::ByGenre { .. } => {
                "/discover/movie".to_string()
            }
            CatalogRequest::Movie(id) => format!("/movie/{}", id),
            CatalogRequest::Credits(id) => format!("/movie/{}/credits", id),
            CatalogRequest::Videos(id) => format!("/movie/{}/videos", id),
            CatalogRequest::Similar { movie_id, .. } => format!("/movie/{}/similar", movie_id),
            CatalogRequest::Images(id) => format!("/movie/{}/images", id),
            CatalogRequest::Person(id) => format!("/person/{}", id),
            CatalogRequest::PersonMovies(id) => format!("/person/{}/movie_credits", id),
        }
    }

    /// Query parameters, excluding the API key.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            CatalogRequest::List { page, .. } | CatalogRequest::Similar { page, .. } => {
                vec![("page", page.to_string())]
            }
            CatalogRequest::Search { query, page } => {
                vec![("query", query.clone()), ("page", page.to_string())]
            }
            CatalogRequest::Discover(discover) => discover.params(),
            CatalogRequest::ByGenre { genre_id, page } => vec![
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
                ("sort_by", SortKey::PopularityDesc.as_str().to_string()),
            ],
            _ => Vec::new(),
        }
    }
}

/// Validate an optional page number, defaulting to 1.
pub fn page_or_default(page: Option<u32>) -> Result<u32, AppError> {
    match page.unwrap_or(1) {
        p @ 1..=MAX_PAGE => Ok(p),
        p => Err(AppError::Validation(format!(
            "page must be between 1 and {}, got {}",
            MAX_PAGE, p
        ))),
    }
}

// ─── Discover filters ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    PopularityDesc,
    PopularityAsc,
    VoteAverageDesc,
    VoteAverageAsc,
    ReleaseDateDesc,
    ReleaseDateAsc,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PopularityDesc => "popularity.desc",
            SortKey::PopularityAsc => "popularity.asc",
            SortKey::VoteAverageDesc => "vote_average.desc",
            SortKey::VoteAverageAsc => "vote_average.asc",
            SortKey::ReleaseDateDesc => "primary_release_date.desc",
            SortKey::ReleaseDateAsc => "primary_release_date.asc",
            SortKey::TitleAsc => "title.asc",
            SortKey::TitleDesc => "title.desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "popularity.desc" => SortKey::PopularityDesc,
            "popularity.asc" => SortKey::PopularityAsc,
            "vote_average.desc" => SortKey::VoteAverageDesc,
            "vote_average.asc" => SortKey::VoteAverageAsc,
            "primary_release_date.desc" => SortKey::ReleaseDateDesc,
            "primary_release_date.asc" => SortKey::ReleaseDateAsc,
            "title.asc" => SortKey::TitleAsc,
            "title.desc" => SortKey::TitleDesc,
            other => {
                return Err(AppError::Validation(format!(
                    "Unsupported sort_by '{}'",
                    other
                )))
            }
        })
    }
}

/// Raw discover filters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoverFilters {
    pub page: Option<u32>,
    pub sort_by: Option<String>,
    /// Comma-separated genre ids
    pub genre: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// ISO 639-1 code
    pub language: Option<String>,
    pub rating_min: Option<f64>,
    pub rating_max: Option<f64>,
}

/// Validated discover query.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub page: u32,
    pub sort_by: SortKey,
    pub genres: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub language: Option<String>,
    pub rating_min: Option<f64>,
    pub rating_max: Option<f64>,
}

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1870..=2200;

fn check_year(name: &str, year: Option<i32>) -> Result<(), AppError> {
    match year {
        Some(y) if !YEAR_RANGE.contains(&y) => Err(AppError::Validation(format!(
            "{} must be a four-digit year",
            name
        ))),
        _ => Ok(()),
    }
}

fn check_rating(name: &str, rating: Option<f64>) -> Result<(), AppError> {
    match rating {
        Some(r) if !(0.0..=10.0).contains(&r) => Err(AppError::Validation(format!(
            "{} must be between 0 and 10",
            name
        ))),
        _ => Ok(()),
    }
}

impl TryFrom<DiscoverFilters> for DiscoverQuery {
    type Error = AppError;

    fn try_from(filters: DiscoverFilters) -> Result<Self, Self::Error> {
        let page = page_or_default(filters.page)?;
        let sort_by = match filters.sort_by.as_deref().map(str::trim) {
            None | Some("") => SortKey::default(),
            Some(s) => s.parse()?,
        };

        let genres = match filters.genre.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let ids: Vec<&str> = raw.split(',').map(str::trim).collect();
                let valid = ids
                    .iter()
                    .all(|id| id.parse::<u32>().map(|n| n > 0).unwrap_or(false));
                if !valid {
                    return Err(AppError::Validation(
                        "genre must be a comma-separated list of genre ids".to_string(),
                    ));
                }
                Some(ids.join(","))
            }
        };

        check_year("year_from", filters.year_from)?;
        check_year("year_to", filters.year_to)?;
        if let (Some(from), Some(to)) = (filters.year_from, filters.year_to) {
            if from > to {
                return Err(AppError::Validation(
                    "year_from must not be after year_to".to_string(),
                ));
            }
        }

        let language = match filters.language.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(code.to_ascii_lowercase())
            }
            Some(_) => {
                return Err(AppError::Validation(
                    "language must be a two-letter ISO 639-1 code".to_string(),
                ))
            }
        };

        check_rating("rating_min", filters.rating_min)?;
        check_rating("rating_max", filters.rating_max)?;
        if let (Some(min), Some(max)) = (filters.rating_min, filters.rating_max) {
            if min > max {
                return Err(AppError::Validation(
                    "rating_min must not exceed rating_max".to_string(),
                ));
            }
        }

        Ok(DiscoverQuery {
            page,
            sort_by,
            genres,
            year_from: filters.year_from,
            year_to: filters.year_to,
            language,
            rating_min: filters.rating_min,
            rating_max: filters.rating_max,
        })
    }
}

impl DiscoverQuery {
    /// Provider query parameters; unset filters are omitted.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("sort_by", self.sort_by.to_string()),
        ];
        if let Some(genres) = &self.genres {
            params.push(("with_genres", genres.clone()));
        }
        if let Some(year) = self.year_from {
            params.push(("primary_release_date.gte", format!("{:04}-01-01", year)));
        }
        if let Some(year) = self.year_to {
            params.push(("primary_release_date.lte", format!("{:04}-12-31", year)));
        }
        if let Some(language) = &self.language {
            params.push(("with_original_language", language.clone()));
        }
        if let Some(rating) = self.rating_min {
            params.push(("vote_average.gte", rating.to_string()));
        }
        if let Some(rating) = self.rating_max {
            params.push(("vote_average.lte", rating.to_string()));
        }
        params
    }
}

// ─── TMDB client ─────────────────────────────────────────────────

/// TMDB API client.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a client; every request is bounded by `timeout`.
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        if api_key.trim().is_empty() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "TMDB API key cannot be empty"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Map a non-success provider status to an error.
    fn check_status(status: reqwest::StatusCode, path: &str) -> Result<(), AppError> {
        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            404 => Err(AppError::NotFound("Resource not found".to_string())),
            429 => {
                tracing::warn!(path, "TMDB rate limit hit (429)");
                Err(AppError::Upstream("rate limited".to_string()))
            }
            401 => Err(AppError::Upstream("API key rejected".to_string())),
            _ => Err(AppError::Upstream(format!("HTTP {} from {}", status, path))),
        }
    }
}

#[async_trait]
impl CatalogProvider for TmdbClient {
    async fn fetch(&self, request: &CatalogRequest) -> Result<serde_json::Value, AppError> {
        let path = request.path();
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(path = %path, "Fetching from TMDB");

        let mut params = request.query();
        params.push(("api_key", self.api_key.clone()));

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("timed out".to_string())
                } else {
                    AppError::Upstream(format!("request to {} failed: {}", path, e))
                }
            })?;

        Self::check_status(response.status(), &path)?;

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Upstream("timed out".to_string())
            } else {
                AppError::Upstream(format!("invalid JSON from {}: {}", path, e))
            }
        })
    }
}
