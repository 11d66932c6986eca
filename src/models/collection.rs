//! Collection model, visibility policy and placement rules
//!
//! The access and placement decisions are pure functions over a membership
//! snapshot; the repository takes the locks that make the snapshot trustworthy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::{RoleSet, UserClaims};

/// Collection visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_code(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    /// Visibility that actually persists for a creator with `roles`.
    ///
    /// A patron who is not a librarian always gets a public collection, at
    /// create and at every subsequent edit, whatever they asked for.
    pub fn coerce_for_creator(self, roles: RoleSet) -> Self {
        if roles.patron && !roles.librarian {
            Visibility::Public
        } else {
            self
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Collection row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Collection {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: i32,
    pub visibility: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub games: Vec<super::game::GameSummary>,
    #[sqlx(skip)]
    #[serde(default)]
    pub authorized_users: Vec<super::user::UserShort>,
    #[sqlx(skip)]
    #[serde(default)]
    pub creator_name: Option<String>,
}

impl Collection {
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private.as_code()
    }

    /// Access rule for one user (or anonymous when `claims` is None).
    ///
    /// Public collections are open to everyone. Private ones admit the
    /// creator, librarians, and explicitly authorized users; anonymous
    /// callers never pass. `is_authorized` is the caller's membership in the
    /// authorized-users set, resolved against storage beforehand.
    pub fn can_user_access(&self, claims: Option<&UserClaims>, is_authorized: bool) -> bool {
        if !self.is_private() {
            return true;
        }
        match claims {
            Some(claims) => {
                claims.user_id == self.creator_id || claims.is_librarian() || is_authorized
            }
            None => false,
        }
    }
}

/// Placement-exclusivity decision for adding a game to a collection.
///
/// `private_memberships`/`public_memberships` count the collections the game
/// currently belongs to. A public collection accepts a game that is in no
/// private collection; a private collection only accepts a game that is in
/// no collection at all.
pub fn can_add_game(
    target: Visibility,
    private_memberships: i64,
    public_memberships: i64,
) -> bool {
    match target {
        Visibility::Public => private_memberships == 0,
        Visibility::Private => private_memberships == 0 && public_memberships == 0,
    }
}

/// Create/update collection request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CollectionPayload {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Users allowed to view the collection when private
    #[serde(default)]
    pub authorized_user_ids: Vec<i32>,
    /// Initial/replacement member games
    #[serde(default)]
    pub game_ids: Vec<i32>,
}

/// Collection list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CollectionQuery {
    pub search: Option<String>,
    pub visibility: Option<String>,
    pub creator: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(user_id: i32, patron: bool, librarian: bool, admin: bool) -> UserClaims {
        UserClaims {
            sub: format!("user-{}", user_id),
            user_id,
            email: format!("user{}@example.org", user_id),
            roles: RoleSet {
                patron,
                librarian,
                admin,
            },
            exp: 0,
            iat: 0,
        }
    }

    fn collection(creator_id: i32, visibility: Visibility) -> Collection {
        Collection {
            id: 1,
            title: "Strategy Favorites".to_string(),
            description: None,
            creator_id,
            visibility: visibility.as_code().to_string(),
            created_at: None,
            updated_at: None,
            games: vec![],
            authorized_users: vec![],
            creator_name: None,
        }
    }

    #[test]
    fn patron_visibility_is_coerced_to_public() {
        let patron = RoleSet {
            patron: true,
            librarian: false,
            admin: false,
        };
        assert_eq!(
            Visibility::Private.coerce_for_creator(patron),
            Visibility::Public
        );
        assert_eq!(
            Visibility::Public.coerce_for_creator(patron),
            Visibility::Public
        );
    }

    #[test]
    fn librarian_keeps_requested_visibility() {
        let librarian = RoleSet {
            patron: true,
            librarian: true,
            admin: false,
        };
        assert_eq!(
            Visibility::Private.coerce_for_creator(librarian),
            Visibility::Private
        );
    }

    #[test]
    fn public_collection_open_to_everyone() {
        let c = collection(1, Visibility::Public);
        assert!(c.can_user_access(None, false));
        assert!(c.can_user_access(Some(&claims(2, true, false, false)), false));
    }

    #[test]
    fn private_collection_access_matrix() {
        let c = collection(10, Visibility::Private);

        // anonymous never passes
        assert!(!c.can_user_access(None, false));
        // creator passes
        assert!(c.can_user_access(Some(&claims(10, true, true, false)), false));
        // librarian passes
        assert!(c.can_user_access(Some(&claims(2, false, true, false)), false));
        // plain patron is denied
        assert!(!c.can_user_access(Some(&claims(3, true, false, false)), false));
        // admin without librarian role is denied
        assert!(!c.can_user_access(Some(&claims(4, false, false, true)), false));
        // authorized patron passes
        assert!(c.can_user_access(Some(&claims(3, true, false, false)), true));
    }

    #[test]
    fn placement_exclusivity() {
        // fresh game goes anywhere
        assert!(can_add_game(Visibility::Public, 0, 0));
        assert!(can_add_game(Visibility::Private, 0, 0));
        // game in a private collection joins nothing else
        assert!(!can_add_game(Visibility::Public, 1, 0));
        assert!(!can_add_game(Visibility::Private, 1, 0));
        // game in public collections can join more public ones, not a private one
        assert!(can_add_game(Visibility::Public, 0, 2));
        assert!(!can_add_game(Visibility::Private, 0, 1));
    }
}
