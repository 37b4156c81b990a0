// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user movie collections and their list disciplines.
//!
//! Favorites and the watchlist are membership sets with toggle semantics.
//! Recently viewed is a recency list: deduplicate, prepend, truncate.

use super::MovieId;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum number of recently viewed entries kept per user.
pub const RECENTLY_VIEWED_CAP: usize = 20;

/// Which membership set a toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Favorites,
    Watchlist,
}

impl CollectionKind {
    /// Backing table name in the relational store.
    pub fn table(&self) -> &'static str {
        match self {
            CollectionKind::Favorites => "favorites",
            CollectionKind::Watchlist => "watchlist",
        }
    }
}

/// Result of a toggle: the set after the change and the new membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub ids: Vec<MovieId>,
    pub member: bool,
}

/// Membership of one movie in both sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MovieStatus {
    pub is_favorite: bool,
    pub in_watchlist: bool,
}

/// Remove `movie_id` if present, append it otherwise. Returns the new membership.
pub fn toggle_membership(ids: &mut Vec<MovieId>, movie_id: MovieId) -> bool {
    if let Some(pos) = ids.iter().position(|&id| id == movie_id) {
        ids.remove(pos);
        false
    } else {
        ids.push(movie_id);
        true
    }
}

/// Move `movie_id` to the front of a recency list and keep at most `cap` entries.
pub fn move_to_front(ids: &mut Vec<MovieId>, movie_id: MovieId, cap: usize) {
    ids.retain(|&id| id != movie_id);
    ids.insert(0, movie_id);
    ids.truncate(cap);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_set() {
        let original = vec![1, 2, 3];
        let mut ids = original.clone();

        assert!(toggle_membership(&mut ids, 603));
        assert_eq!(ids, vec![1, 2, 3, 603]);
        assert!(!toggle_membership(&mut ids, 603));
        assert_eq!(ids, original);

        assert!(!toggle_membership(&mut ids, 2));
        assert!(toggle_membership(&mut ids, 2));
        ids.sort();
        assert_eq!(ids, original);
    }

    #[test]
    fn test_move_to_front_dedupes() {
        let mut ids = Vec::new();
        for id in [5, 3, 5] {
            move_to_front(&mut ids, id, RECENTLY_VIEWED_CAP);
        }
        assert_eq!(ids, vec![5, 3]);
    }

    #[test]
    fn test_move_to_front_caps_length() {
        let mut ids = Vec::new();
        for id in 1..=25 {
            move_to_front(&mut ids, id, RECENTLY_VIEWED_CAP);
        }
        assert_eq!(ids.len(), RECENTLY_VIEWED_CAP);
        assert_eq!(ids[0], 25);
        assert_eq!(*ids.last().unwrap(), 6);

        // Re-viewing the oldest surviving entry refreshes it without growth
        move_to_front(&mut ids, 6, RECENTLY_VIEWED_CAP);
        assert_eq!(ids.len(), RECENTLY_VIEWED_CAP);
        assert_eq!(ids[0], 6);
        assert_eq!(ids[1], 25);
    }
}
