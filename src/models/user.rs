//! User model for storage and API.

use super::collection::MovieStatus;
use super::MovieId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// User account as seen by the application. Never carries credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Lower-cased, unique
    pub email: String,
    pub role: Role,
    /// Avatar URL or empty
    pub avatar: String,
    /// Membership set, insertion order
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub favorites: Vec<MovieId>,
    /// Membership set, insertion order
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub watchlist: Vec<MovieId>,
    /// Most recent first, at most 20 entries
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub recently_viewed: Vec<MovieId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Favorite/watchlist membership for one movie (pure read).
    pub fn status_of(&self, movie_id: MovieId) -> MovieStatus {
        MovieStatus {
            is_favorite: self.favorites.contains(&movie_id),
            in_watchlist: self.watchlist.contains(&movie_id),
        }
    }
}

/// A user together with the stored password hash. Only the login path and the
/// stores see this type.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial profile update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            role: Role::User,
            avatar: String::new(),
            favorites: vec![603, 27205],
            watchlist: vec![155],
            recently_viewed: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trip_strings() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_status_of() {
        let u = user();
        let s = u.status_of(603);
        assert!(s.is_favorite);
        assert!(!s.in_watchlist);
        assert!(u.status_of(155).in_watchlist);
    }

    #[test]
    fn test_user_json_is_camel_case() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("recentlyViewed").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["role"], "user");
        assert!(json.get("password").is_none());
    }
}
