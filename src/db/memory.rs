// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process account store.
//!
//! Used by the test suite and for local runs without `DATABASE_URL`. Each
//! operation holds at most one map entry lock at a time, except where an
//! entry lock is the uniqueness guard (emails, review keys); those guards are
//! always taken before any user entry so lock order stays acyclic.

use super::{AccountStore, Page, StoreCounts};
use crate::error::AppError;
use crate::models::collection::{move_to_front, toggle_membership};
use crate::models::{
    CollectionKind, FeaturedMovie, FeaturedMovieUpdate, MovieId, NewFeaturedMovie, NewReview,
    NewUser, ProfileChanges, Review, ReviewUpdate, ReviewWithReviewer, Reviewer, Role,
    ToggleOutcome, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: DashMap<Uuid, UserCredentials>,
    /// Unique email index
    emails: DashMap<String, Uuid>,
    reviews: DashMap<Uuid, Review>,
    /// Unique (user, movie) index over reviews
    review_keys: DashMap<(Uuid, MovieId), Uuid>,
    featured: DashMap<Uuid, FeaturedMovie>,
}

/// In-memory account store. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn reviewer(&self, user_id: Uuid) -> Option<Reviewer> {
        self.tables.users.get(&user_id).map(|u| Reviewer {
            name: u.user.name.clone(),
            avatar: u.user.avatar.clone(),
        })
    }

    /// Join reviews with reviewer fields, newest first. Reviews whose author
    /// vanished concurrently are skipped.
    fn joined(&self, mut reviews: Vec<Review>) -> Vec<ReviewWithReviewer> {
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
            .into_iter()
            .filter_map(|review| {
                let user = self.reviewer(review.user_id)?;
                Some(ReviewWithReviewer {
                    review,
                    user,
                    is_own: None,
                })
            })
            .collect()
    }

    fn collect_reviews(&self, keep: impl Fn(&Review) -> bool) -> Vec<Review> {
        self.tables
            .reviews
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        match self.tables.emails.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::EmailTaken),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    name: new_user.name,
                    email: new_user.email,
                    role: new_user.role,
                    avatar: String::new(),
                    favorites: Vec::new(),
                    watchlist: Vec::new(),
                    recently_viewed: Vec::new(),
                    created_at: Utc::now(),
                };
                self.tables.users.insert(
                    user.id,
                    UserCredentials {
                        user: user.clone(),
                        password_hash: new_user.password_hash,
                    },
                );
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.users.get(&id).map(|u| u.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let Some(id) = self.tables.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.tables.users.get(&id).map(|u| u.clone()))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        // Reserve the new email first so the uniqueness check and the claim are one step
        let mut reserved = None;
        if let Some(email) = &changes.email {
            match self.tables.emails.entry(email.clone()) {
                Entry::Occupied(owner) if *owner.get() != id => return Err(AppError::EmailTaken),
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                    reserved = Some(email.clone());
                }
            }
        }

        let previous_email = match self.tables.users.get_mut(&id) {
            Some(mut record) => {
                let previous = record.user.email.clone();
                if let Some(name) = changes.name {
                    record.user.name = name;
                }
                if let Some(email) = changes.email {
                    record.user.email = email;
                }
                if let Some(avatar) = changes.avatar {
                    record.user.avatar = avatar;
                }
                if let Some(hash) = changes.password_hash {
                    record.password_hash = hash;
                }
                previous
            }
            None => {
                if let Some(email) = reserved {
                    self.tables.emails.remove(&email);
                }
                return Ok(None);
            }
        };

        if reserved.is_some() {
            self.tables.emails.remove(&previous_email);
        }
        self.get_user(id).await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        Ok(self.tables.users.get_mut(&id).map(|mut record| {
            record.user.role = role;
            record.user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let Some((_, record)) = self.tables.users.remove(&id) else {
            return Ok(false);
        };
        self.tables.emails.remove(&record.user.email);
        self.tables.reviews.retain(|_, review| review.user_id != id);
        self.tables.review_keys.retain(|(user_id, _), _| *user_id != id);
        Ok(true)
    }

    async fn list_users(&self, page: Page) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .tables
            .users
            .iter()
            .map(|u| u.user.clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(window(users, page))
    }

    async fn toggle_collection(
        &self,
        user_id: Uuid,
        kind: CollectionKind,
        movie_id: MovieId,
    ) -> Result<ToggleOutcome, AppError> {
        let mut record = self
            .tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("User"))?;
        let ids = match kind {
            CollectionKind::Favorites => &mut record.user.favorites,
            CollectionKind::Watchlist => &mut record.user.watchlist,
        };
        let member = toggle_membership(ids, movie_id);
        Ok(ToggleOutcome {
            ids: ids.clone(),
            member,
        })
    }

    async fn collection(
        &self,
        user_id: Uuid,
        kind: CollectionKind,
    ) -> Result<Vec<MovieId>, AppError> {
        let record = self
            .tables
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(match kind {
            CollectionKind::Favorites => record.user.favorites.clone(),
            CollectionKind::Watchlist => record.user.watchlist.clone(),
        })
    }

    async fn record_view(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
        cap: usize,
    ) -> Result<Vec<MovieId>, AppError> {
        let mut record = self
            .tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("User"))?;
        move_to_front(&mut record.user.recently_viewed, movie_id, cap);
        Ok(record.user.recently_viewed.clone())
    }

    async fn recently_viewed(&self, user_id: Uuid) -> Result<Vec<MovieId>, AppError> {
        self.tables
            .users
            .get(&user_id)
            .map(|record| record.user.recently_viewed.clone())
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn create_review(&self, new_review: NewReview) -> Result<ReviewWithReviewer, AppError> {
        match self
            .tables
            .review_keys
            .entry((new_review.user_id, new_review.movie_id))
        {
            Entry::Occupied(_) => Err(AppError::DuplicateReview),
            Entry::Vacant(slot) => {
                let user = self
                    .reviewer(new_review.user_id)
                    .ok_or_else(|| AppError::not_found("User"))?;
                let review = Review {
                    id: Uuid::new_v4(),
                    user_id: new_review.user_id,
                    movie_id: new_review.movie_id,
                    rating: new_review.rating,
                    comment: new_review.comment,
                    created_at: Utc::now(),
                };
                self.tables.reviews.insert(review.id, review.clone());
                slot.insert(review.id);
                Ok(ReviewWithReviewer {
                    review,
                    user,
                    is_own: None,
                })
            }
        }
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        Ok(self.tables.reviews.get(&id).map(|r| r.clone()))
    }

    async fn update_review(
        &self,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<ReviewWithReviewer>, AppError> {
        let updated = match self.tables.reviews.get_mut(&id) {
            Some(mut review) => {
                update.apply(&mut review);
                review.clone()
            }
            None => return Ok(None),
        };
        let user = self
            .reviewer(updated.user_id)
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(Some(ReviewWithReviewer {
            review: updated,
            user,
            is_own: None,
        }))
    }

    async fn delete_review(&self, id: Uuid) -> Result<bool, AppError> {
        match self.tables.reviews.remove(&id) {
            Some((_, review)) => {
                self.tables
                    .review_keys
                    .remove(&(review.user_id, review.movie_id));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reviews_for_movie(
        &self,
        movie_id: MovieId,
    ) -> Result<Vec<ReviewWithReviewer>, AppError> {
        Ok(self.joined(self.collect_reviews(|r| r.movie_id == movie_id)))
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewWithReviewer>, AppError> {
        Ok(self.joined(self.collect_reviews(|r| r.user_id == user_id)))
    }

    async fn list_reviews(&self, page: Page) -> Result<Vec<ReviewWithReviewer>, AppError> {
        Ok(window(self.joined(self.collect_reviews(|_| true)), page))
    }

    async fn list_featured(&self) -> Result<Vec<FeaturedMovie>, AppError> {
        let mut movies: Vec<FeaturedMovie> = self
            .tables
            .featured
            .iter()
            .map(|m| m.value().clone())
            .collect();
        movies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(movies)
    }

    async fn create_featured(&self, movie: NewFeaturedMovie) -> Result<FeaturedMovie, AppError> {
        let featured = FeaturedMovie {
            id: Uuid::new_v4(),
            tmdb_id: movie.tmdb_id,
            title: movie.title,
            overview: movie.overview,
            poster_path: movie.poster_path,
            backdrop_path: movie.backdrop_path,
            created_at: Utc::now(),
        };
        self.tables.featured.insert(featured.id, featured.clone());
        Ok(featured)
    }

    async fn update_featured(
        &self,
        id: Uuid,
        update: FeaturedMovieUpdate,
    ) -> Result<Option<FeaturedMovie>, AppError> {
        Ok(self.tables.featured.get_mut(&id).map(|mut movie| {
            update.apply(&mut movie);
            movie.clone()
        }))
    }

    async fn delete_featured(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.featured.remove(&id).is_some())
    }

    async fn counts(&self) -> Result<StoreCounts, AppError> {
        Ok(StoreCounts {
            users: self.tables.users.len() as u64,
            reviews: self.tables.reviews.len() as u64,
            featured_movies: self.tables.featured.len() as u64,
        })
    }
}
