// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reelhouse: movie discovery backend
//!
//! This crate provides the HTTP API behind the movie discovery client:
//! accounts and sessions, per-user favorites/watchlist/recently-viewed
//! collections, movie reviews, admin tools, and a proxy to the TMDB catalog.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;

use config::Config;
use db::AccountStore;
use services::{AccountCollections, AccountService, CatalogProvider, ReviewService};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AccountStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub accounts: AccountService,
    pub reviews: ReviewService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn AccountStore>,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Self {
        let accounts = AccountService::new(
            store.clone(),
            &config.jwt_signing_key,
            config.bcrypt_cost,
        );
        let reviews = ReviewService::new(store.clone());
        Self {
            config,
            store,
            catalog,
            accounts,
            reviews,
        }
    }

    /// Collections of one signed-in user.
    pub fn collections_for(&self, user_id: Uuid) -> AccountCollections {
        AccountCollections::new(self.store.clone(), user_id)
    }
}
