//! Admin-curated featured movies, stored locally (not part of the catalog).

use super::MovieId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedMovie {
    pub id: Uuid,
    /// Catalog id of the featured movie
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub tmdb_id: MovieId,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewFeaturedMovie {
    #[validate(range(min = 1, message = "must be a positive catalog id"))]
    pub tmdb_id: MovieId,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedMovieUpdate {
    #[validate(range(min = 1, message = "must be a positive catalog id"))]
    pub tmdb_id: Option<MovieId>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl FeaturedMovieUpdate {
    pub fn apply(&self, movie: &mut FeaturedMovie) {
        if let Some(tmdb_id) = self.tmdb_id {
            movie.tmdb_id = tmdb_id;
        }
        if let Some(title) = &self.title {
            movie.title = title.clone();
        }
        if self.overview.is_some() {
            movie.overview = self.overview.clone();
        }
        if self.poster_path.is_some() {
            movie.poster_path = self.poster_path.clone();
        }
        if self.backdrop_path.is_some() {
            movie.backdrop_path = self.backdrop_path.clone();
        }
    }
}
