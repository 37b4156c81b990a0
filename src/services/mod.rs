// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod catalog;
pub mod collections;
pub mod reviews;

pub use accounts::{AccountService, Session};
pub use catalog::{CatalogProvider, CatalogRequest, TmdbClient};
pub use collections::{AccountCollections, CollectionRepository, LocalCollections};
pub use reviews::ReviewService;
