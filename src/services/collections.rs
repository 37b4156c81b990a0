// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorites, watchlist and recently-viewed collections.
//!
//! `CollectionRepository` is the contract shared by signed-in users
//! (`AccountCollections`, backed by the account store) and anonymous
//! visitors (`LocalCollections`, a standalone JSON document). Both give the
//! same toggle and recency semantics.

use crate::db::AccountStore;
use crate::error::AppError;
use crate::models::collection::{move_to_front, toggle_membership, RECENTLY_VIEWED_CAP};
use crate::models::{CollectionKind, MovieId, MovieStatus, ToggleOutcome};
use crate::services::catalog::{CatalogProvider, CatalogRequest};
use anyhow::Context;
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Catalog lookups in flight when resolving a collection listing.
pub const LOOKUP_CONCURRENCY: usize = 8;

/// Recently viewed entries resolved for the listing endpoint.
pub const RECENT_LISTING_LEN: usize = 10;

#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// Add the movie if absent, remove it if present.
    async fn toggle(
        &self,
        kind: CollectionKind,
        movie_id: MovieId,
    ) -> Result<ToggleOutcome, AppError>;

    /// Move the movie to the front of the recency list (capped).
    async fn record_view(&self, movie_id: MovieId) -> Result<Vec<MovieId>, AppError>;

    async fn list(&self, kind: CollectionKind) -> Result<Vec<MovieId>, AppError>;

    /// Most recent first.
    async fn recently_viewed(&self) -> Result<Vec<MovieId>, AppError>;

    async fn status(&self, movie_id: MovieId) -> Result<MovieStatus, AppError> {
        Ok(MovieStatus {
            is_favorite: self
                .list(CollectionKind::Favorites)
                .await?
                .contains(&movie_id),
            in_watchlist: self
                .list(CollectionKind::Watchlist)
                .await?
                .contains(&movie_id),
        })
    }
}

// ─── Signed-in users ─────────────────────────────────────────────

/// Collections of one account, stored in the account store.
#[derive(Clone)]
pub struct AccountCollections {
    store: Arc<dyn AccountStore>,
    user_id: Uuid,
}

impl AccountCollections {
    pub fn new(store: Arc<dyn AccountStore>, user_id: Uuid) -> Self {
        Self { store, user_id }
    }
}

#[async_trait]
impl CollectionRepository for AccountCollections {
    async fn toggle(
        &self,
        kind: CollectionKind,
        movie_id: MovieId,
    ) -> Result<ToggleOutcome, AppError> {
        let outcome = self
            .store
            .toggle_collection(self.user_id, kind, movie_id)
            .await?;
        tracing::debug!(
            user_id = %self.user_id,
            movie_id,
            collection = kind.table(),
            member = outcome.member,
            "Toggled collection"
        );
        Ok(outcome)
    }

    async fn record_view(&self, movie_id: MovieId) -> Result<Vec<MovieId>, AppError> {
        self.store
            .record_view(self.user_id, movie_id, RECENTLY_VIEWED_CAP)
            .await
    }

    async fn list(&self, kind: CollectionKind) -> Result<Vec<MovieId>, AppError> {
        self.store.collection(self.user_id, kind).await
    }

    async fn recently_viewed(&self) -> Result<Vec<MovieId>, AppError> {
        self.store.recently_viewed(self.user_id).await
    }
}

// ─── Anonymous visitors ──────────────────────────────────────────

/// Stored form of the anonymous collections, using the browser's key names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    #[serde(default)]
    pub favorites: Vec<MovieId>,
    #[serde(default)]
    pub watchlist: Vec<MovieId>,
    #[serde(default)]
    pub recently_viewed: Vec<MovieId>,
}

impl LocalSnapshot {
    fn ids_mut(&mut self, kind: CollectionKind) -> &mut Vec<MovieId> {
        match kind {
            CollectionKind::Favorites => &mut self.favorites,
            CollectionKind::Watchlist => &mut self.watchlist,
        }
    }

    fn ids(&self, kind: CollectionKind) -> &[MovieId] {
        match kind {
            CollectionKind::Favorites => &self.favorites,
            CollectionKind::Watchlist => &self.watchlist,
        }
    }
}

/// Collections with no server identity, optionally persisted to a JSON file.
///
/// Never merged into an account.
pub struct LocalCollections {
    state: Mutex<LocalSnapshot>,
    path: Option<PathBuf>,
}

impl LocalCollections {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(LocalSnapshot::default()),
            path: None,
        }
    }

    /// Open a file-backed store. A missing file starts empty; an unreadable
    /// document is discarded, as browsers do with corrupt local storage.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let mut snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<LocalSnapshot>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Discarding unreadable local collections"
                );
                LocalSnapshot::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalSnapshot::default(),
            Err(e) => {
                return Err(anyhow::Error::from(e)
                    .context(format!("reading {}", path.display()))
                    .into())
            }
        };
        snapshot.recently_viewed.truncate(RECENTLY_VIEWED_CAP);

        Ok(Self {
            state: Mutex::new(snapshot),
            path: Some(path),
        })
    }

    pub async fn snapshot(&self) -> LocalSnapshot {
        self.state.lock().await.clone()
    }

    /// Write through to the backing file (if any). Called with the lock held
    /// so writes land in mutation order.
    async fn persist(&self, snapshot: &LocalSnapshot) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(snapshot).context("encoding local collections")?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl CollectionRepository for LocalCollections {
    async fn toggle(
        &self,
        kind: CollectionKind,
        movie_id: MovieId,
    ) -> Result<ToggleOutcome, AppError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let ids = next.ids_mut(kind);
        let member = toggle_membership(ids, movie_id);
        let outcome = ToggleOutcome {
            ids: ids.clone(),
            member,
        };
        self.persist(&next).await?;
        *state = next;
        Ok(outcome)
    }

    async fn record_view(&self, movie_id: MovieId) -> Result<Vec<MovieId>, AppError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        move_to_front(&mut next.recently_viewed, movie_id, RECENTLY_VIEWED_CAP);
        self.persist(&next).await?;
        *state = next;
        Ok(state.recently_viewed.clone())
    }

    async fn list(&self, kind: CollectionKind) -> Result<Vec<MovieId>, AppError> {
        Ok(self.state.lock().await.ids(kind).to_vec())
    }

    async fn recently_viewed(&self) -> Result<Vec<MovieId>, AppError> {
        Ok(self.state.lock().await.recently_viewed.clone())
    }
}

// ─── Listing ─────────────────────────────────────────────────────

/// Fetch catalog details for `ids`, keeping their order and skipping ids
/// the catalog cannot resolve.
pub async fn resolve_movies(
    catalog: &dyn CatalogProvider,
    ids: &[MovieId],
) -> Vec<serde_json::Value> {
    stream::iter(ids.iter().copied())
        .map(|movie_id| async move {
            match catalog.fetch(&CatalogRequest::Movie(movie_id)).await {
                Ok(movie) => Some(movie),
                Err(e) => {
                    tracing::debug!(
                        movie_id,
                        error = %e,
                        "Dropping unresolvable movie from listing"
                    );
                    None
                }
            }
        })
        .buffered(LOOKUP_CONCURRENCY)
        .filter_map(|movie| async move { movie })
        .collect()
        .await
}
