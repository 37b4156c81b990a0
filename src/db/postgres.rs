// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres-backed account store.
//!
//! Collections are stored one row per element, so a toggle is a single
//! delete-or-insert statement under a per-user row lock and concurrent
//! toggles never overwrite each other. Review uniqueness is enforced by the
//! `(user_id, movie_id)` unique constraint.

use super::{AccountStore, Page, StoreCounts};
use crate::error::AppError;
use crate::models::{
    CollectionKind, FeaturedMovie, FeaturedMovieUpdate, MovieId, NewFeaturedMovie, NewReview,
    NewUser, ProfileChanges, Review, ReviewUpdate, ReviewWithReviewer, Reviewer, Role,
    ToggleOutcome, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use uuid::Uuid;

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.role, u.avatar, u.created_at, \
     ARRAY(SELECT f.movie_id FROM favorites f WHERE f.user_id = u.id \
           ORDER BY f.added_at, f.movie_id) AS favorites, \
     ARRAY(SELECT w.movie_id FROM watchlist w WHERE w.user_id = u.id \
           ORDER BY w.added_at, w.movie_id) AS watchlist, \
     ARRAY(SELECT v.movie_id FROM recently_viewed v WHERE v.user_id = u.id \
           ORDER BY v.viewed_at DESC) AS recently_viewed";

const REVIEW_COLUMNS: &str = "r.id, r.user_id, r.movie_id, r.rating, r.comment, r.created_at, \
     u.name AS reviewer_name, u.avatar AS reviewer_avatar";

const FEATURED_COLUMNS: &str =
    "id, tmdb_id, title, overview, poster_path, backdrop_path, created_at";

/// Postgres account store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect a pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))?;

        tracing::info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    async fn fetch_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(User::try_from)
            .transpose()
    }

    async fn fetch_reviews(
        &self,
        filter: ReviewFilter,
    ) -> Result<Vec<ReviewWithReviewer>, AppError> {
        let (condition, window) = match filter {
            ReviewFilter::Movie(_) => ("WHERE r.movie_id = $1", ""),
            ReviewFilter::User(_) => ("WHERE r.user_id = $1", ""),
            ReviewFilter::Page(_) => ("", "LIMIT $1 OFFSET $2"),
        };
        let sql = format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id {} \
             ORDER BY r.created_at DESC, r.id {}",
            REVIEW_COLUMNS, condition, window
        );
        let query = sqlx::query_as::<_, ReviewRow>(&sql);
        let query = match filter {
            ReviewFilter::Movie(movie_id) => query.bind(movie_id),
            ReviewFilter::User(user_id) => query.bind(user_id),
            ReviewFilter::Page(page) => query.bind(page.limit as i64).bind(page.offset as i64),
        };
        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(ReviewWithReviewer::try_from)
            .collect()
    }
}

#[derive(Clone, Copy)]
enum ReviewFilter {
    Movie(MovieId),
    User(Uuid),
    Page(Page),
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ─── Row types ───────────────────────────────────────────────────

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    avatar: String,
    created_at: DateTime<Utc>,
    favorites: Vec<i64>,
    watchlist: Vec<i64>,
    recently_viewed: Vec<i64>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse::<Role>().map_err(AppError::Database)?,
            avatar: row.avatar,
            favorites: row.favorites,
            watchlist: row.watchlist,
            recently_viewed: row.recently_viewed,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: i64,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
    reviewer_name: String,
    reviewer_avatar: String,
}

impl TryFrom<ReviewRow> for ReviewWithReviewer {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| AppError::Database(format!("rating {} out of range", row.rating)))?;
        Ok(ReviewWithReviewer {
            review: Review {
                id: row.id,
                user_id: row.user_id,
                movie_id: row.movie_id,
                rating,
                comment: row.comment,
                created_at: row.created_at,
            },
            user: Reviewer {
                name: row.reviewer_name,
                avatar: row.reviewer_avatar,
            },
            is_own: None,
        })
    }
}

#[derive(FromRow)]
struct FeaturedRow {
    id: Uuid,
    tmdb_id: i64,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<FeaturedRow> for FeaturedMovie {
    fn from(row: FeaturedRow) -> Self {
        FeaturedMovie {
            id: row.id,
            tmdb_id: row.tmdb_id,
            title: row.title,
            overview: row.overview,
            poster_path: row.poster_path,
            backdrop_path: row.backdrop_path,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::EmailTaken
            } else {
                db_err(e)
            }
        })?;

        self.fetch_user(id)
            .await?
            .ok_or_else(|| AppError::Database("created user vanished".to_string()))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.fetch_user(id).await
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let sql = format!(
            "SELECT {}, u.password_hash FROM users u WHERE u.email = $1",
            USER_COLUMNS
        );
        let Some(row) = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        Ok(Some(UserCredentials {
            user: User::try_from(row.user)?,
            password_hash: row.password_hash,
        }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 avatar = COALESCE($4, avatar), \
                 password_hash = COALESCE($5, password_hash) \
             WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.avatar)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::EmailTaken
            } else {
                db_err(e)
            }
        })?;

        match updated {
            Some(id) => self.fetch_user(id).await,
            None => Ok(None),
        }
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let updated: Option<Uuid> =
            sqlx::query_scalar("UPDATE users SET role = $2 WHERE id = $1 RETURNING id")
                .bind(id)
                .bind(role.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        match updated {
            Some(id) => self.fetch_user(id).await,
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        // Reviews and collection rows go with the user via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users u ORDER BY u.created_at DESC, u.id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(page.limit as i64)
            .bind(page.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    // ─── Collections ─────────────────────────────────────────────

    async fn toggle_collection(
        &self,
        user_id: Uuid,
        kind: CollectionKind,
        movie_id: MovieId,
    ) -> Result<ToggleOutcome, AppError> {
        let table = kind.table();
        let toggle = format!(
            "WITH removed AS ( \
                 DELETE FROM {table} WHERE user_id = $1 AND movie_id = $2 RETURNING movie_id \
             ) \
             INSERT INTO {table} (user_id, movie_id) \
             SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM removed) \
             ON CONFLICT DO NOTHING \
             RETURNING movie_id"
        );
        let list = format!(
            "SELECT movie_id FROM {table} WHERE user_id = $1 ORDER BY added_at, movie_id"
        );

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        // Toggles for one user run one at a time, so two concurrent toggles
        // of the same movie always end as add then remove
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        if locked.is_none() {
            return Err(AppError::not_found("User"));
        }

        let inserted: Option<i64> = sqlx::query_scalar(&toggle)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        let ids: Vec<i64> = sqlx::query_scalar(&list)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok(ToggleOutcome {
            ids,
            member: inserted.is_some(),
        })
    }

    async fn collection(
        &self,
        user_id: Uuid,
        kind: CollectionKind,
    ) -> Result<Vec<MovieId>, AppError> {
        let sql = format!(
            "SELECT movie_id FROM {} WHERE user_id = $1 ORDER BY added_at, movie_id",
            kind.table()
        );
        sqlx::query_scalar(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn record_view(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        cap: usize,
    ) -> Result<Vec<MovieId>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO recently_viewed (user_id, movie_id, viewed_at) \
             VALUES ($1, $2, clock_timestamp()) \
             ON CONFLICT (user_id, movie_id) DO UPDATE SET viewed_at = EXCLUDED.viewed_at",
        )
        .bind(user_id)
        .bind(movie_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query(
            "DELETE FROM recently_viewed WHERE user_id = $1 AND movie_id NOT IN ( \
                 SELECT movie_id FROM recently_viewed WHERE user_id = $1 \
                 ORDER BY viewed_at DESC LIMIT $2 \
             )",
        )
        .bind(user_id)
        .bind(cap as i64)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT movie_id FROM recently_viewed WHERE user_id = $1 ORDER BY viewed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(ids)
    }

    async fn recently_viewed(&self, user_id: Uuid) -> Result<Vec<MovieId>, AppError> {
        sqlx::query_scalar(
            "SELECT movie_id FROM recently_viewed WHERE user_id = $1 ORDER BY viewed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    // ─── Reviews ─────────────────────────────────────────────────

    async fn create_review(&self, review: NewReview) -> Result<ReviewWithReviewer, AppError> {
        let sql = format!(
            "WITH r AS ( \
                 INSERT INTO reviews (id, user_id, movie_id, rating, comment) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING * \
             ) \
             SELECT {} FROM r JOIN users u ON u.id = r.user_id",
            REVIEW_COLUMNS
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(review.user_id)
            .bind(review.movie_id)
            .bind(i16::from(review.rating))
            .bind(&review.comment)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateReview
                } else {
                    db_err(e)
                }
            })?;
        ReviewWithReviewer::try_from(row)
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let sql = format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id WHERE r.id = $1",
            REVIEW_COLUMNS
        );
        sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| ReviewWithReviewer::try_from(row).map(|r| r.review))
            .transpose()
    }

    async fn update_review(
        &self,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<ReviewWithReviewer>, AppError> {
        let sql = format!(
            "WITH r AS ( \
                 UPDATE reviews SET \
                     rating = COALESCE($2, rating), \
                     comment = COALESCE($3, comment) \
                 WHERE id = $1 RETURNING * \
             ) \
             SELECT {} FROM r JOIN users u ON u.id = r.user_id",
            REVIEW_COLUMNS
        );
        sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .bind(update.rating.map(i16::from))
            .bind(update.comment)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(ReviewWithReviewer::try_from)
            .transpose()
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_movie(
        &self,
        movie_id: MovieId,
    ) -> Result<Vec<ReviewWithReviewer>, AppError> {
        self.fetch_reviews(ReviewFilter::Movie(movie_id)).await
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewWithReviewer>, AppError> {
        self.fetch_reviews(ReviewFilter::User(user_id)).await
    }

    async fn list_reviews(&self, page: Page) -> Result<Vec<ReviewWithReviewer>, AppError> {
        self.fetch_reviews(ReviewFilter::Page(page)).await
    }

    // ─── Featured movies ─────────────────────────────────────────

    async fn list_featured(&self) -> Result<Vec<FeaturedMovie>, AppError> {
        let sql = format!(
            "SELECT {} FROM featured_movies ORDER BY created_at DESC, id",
            FEATURED_COLUMNS
        );
        Ok(sqlx::query_as::<_, FeaturedRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(FeaturedMovie::from)
            .collect())
    }

    async fn create_featured(&self, movie: NewFeaturedMovie) -> Result<FeaturedMovie, AppError> {
        let sql = format!(
            "INSERT INTO featured_movies \
                 (id, tmdb_id, title, overview, poster_path, backdrop_path) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            FEATURED_COLUMNS
        );
        sqlx::query_as::<_, FeaturedRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(movie.tmdb_id)
            .bind(movie.title)
            .bind(movie.overview)
            .bind(movie.poster_path)
            .bind(movie.backdrop_path)
            .fetch_one(&self.pool)
            .await
            .map(FeaturedMovie::from)
            .map_err(db_err)
    }

    async fn update_featured(
        &self,
        id: Uuid,
        update: FeaturedMovieUpdate,
    ) -> Result<Option<FeaturedMovie>, AppError> {
        let sql = format!(
            "UPDATE featured_movies SET \
                 tmdb_id = COALESCE($2, tmdb_id), \
                 title = COALESCE($3, title), \
                 overview = COALESCE($4, overview), \
                 poster_path = COALESCE($5, poster_path), \
                 backdrop_path = COALESCE($6, backdrop_path) \
             WHERE id = $1 RETURNING {}",
            FEATURED_COLUMNS
        );
        Ok(sqlx::query_as::<_, FeaturedRow>(&sql)
            .bind(id)
            .bind(update.tmdb_id)
            .bind(update.title)
            .bind(update.overview)
            .bind(update.poster_path)
            .bind(update.backdrop_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(FeaturedMovie::from))
    }

    async fn delete_featured(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM featured_movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Dashboard ───────────────────────────────────────────────

    async fn counts(&self) -> Result<StoreCounts, AppError> {
        let (users, reviews, featured): (i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT count(*) FROM users), \
                    (SELECT count(*) FROM reviews), \
                    (SELECT count(*) FROM featured_movies)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(StoreCounts {
            users: users.max(0) as u64,
            reviews: reviews.max(0) as u64,
            featured_movies: featured.max(0) as u64,
        })
    }
}
