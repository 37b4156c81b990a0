// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod collection;
pub mod featured;
pub mod review;
pub mod user;

pub use collection::{CollectionKind, MovieStatus, ToggleOutcome};
pub use featured::{FeaturedMovie, FeaturedMovieUpdate, NewFeaturedMovie};
pub use review::{NewReview, Review, ReviewUpdate, ReviewWithReviewer, Reviewer};
pub use user::{NewUser, ProfileChanges, Role, User, UserCredentials};

/// External catalog movie identifier (TMDB id).
pub type MovieId = i64;
