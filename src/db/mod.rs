//! Account store: users, collections, reviews and featured movies.
//!
//! `PostgresStore` talks to the managed Postgres database; `MemoryStore` keeps
//! everything in process for tests and local runs without a database. Both
//! give the same guarantees: collection toggles are atomic per element and a
//! second review for the same (user, movie) fails with `DuplicateReview`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::AppError;
use crate::models::{
    CollectionKind, FeaturedMovie, FeaturedMovieUpdate, MovieId, NewFeaturedMovie, NewReview,
    NewUser, ProfileChanges, Review, ReviewUpdate, ReviewWithReviewer, Role, ToggleOutcome, User,
    UserCredentials,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Row counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub users: u64,
    pub reviews: u64,
    pub featured_movies: u64,
}

/// Offset/limit window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub const fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    /// Create a user. Fails with `EmailTaken` if the email is registered.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Look up a user and password hash for login.
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;

    /// Apply a profile update. `Ok(None)` if the user does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError>;

    /// Delete a user with their reviews and collections. Returns whether a user was removed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;

    /// Users, newest first.
    async fn list_users(&self, page: Page) -> Result<Vec<User>, AppError>;

    // ─── Collections ─────────────────────────────────────────────

    /// Atomically add `movie_id` if absent or remove it if present.
    async fn toggle_collection(
        &self,
        user_id: Uuid,
        kind: CollectionKind,
        movie_id: MovieId,
    ) -> Result<ToggleOutcome, AppError>;

    async fn collection(&self, user_id: Uuid, kind: CollectionKind)
        -> Result<Vec<MovieId>, AppError>;

    /// Move `movie_id` to the front of the recency list, keeping `cap` entries.
    /// Returns the list, most recent first.
    async fn record_view(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        cap: usize,
    ) -> Result<Vec<MovieId>, AppError>;

    async fn recently_viewed(&self, user_id: Uuid) -> Result<Vec<MovieId>, AppError>;

    // ─── Reviews ─────────────────────────────────────────────────

    /// Insert a review. Fails with `DuplicateReview` if (user, movie) already has one.
    async fn create_review(&self, review: NewReview) -> Result<ReviewWithReviewer, AppError>;

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError>;

    async fn update_review(
        &self,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<ReviewWithReviewer>, AppError>;

    async fn delete_review(&self, id: Uuid) -> Result<bool, AppError>;

    /// Reviews for one movie, newest first.
    async fn reviews_for_movie(&self, movie_id: MovieId)
        -> Result<Vec<ReviewWithReviewer>, AppError>;

    /// Reviews written by one user, newest first.
    async fn reviews_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewWithReviewer>, AppError>;

    /// All reviews, newest first.
    async fn list_reviews(&self, page: Page) -> Result<Vec<ReviewWithReviewer>, AppError>;

    // ─── Featured movies ─────────────────────────────────────────

    async fn list_featured(&self) -> Result<Vec<FeaturedMovie>, AppError>;

    async fn create_featured(&self, movie: NewFeaturedMovie) -> Result<FeaturedMovie, AppError>;

    async fn update_featured(
        &self,
        id: Uuid,
        update: FeaturedMovieUpdate,
    ) -> Result<Option<FeaturedMovie>, AppError>;

    async fn delete_featured(&self, id: Uuid) -> Result<bool, AppError>;

    // ─── Dashboard ───────────────────────────────────────────────

    async fn counts(&self) -> Result<StoreCounts, AppError>;
}
