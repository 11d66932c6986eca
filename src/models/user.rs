//! User model and related types
//!
//! Identity provisioning (account creation, social login) lives outside this
//! server. What arrives here is a signed JWT whose claims carry the user id
//! and a capability set; the users table keeps a profile row per account for
//! foreign keys and capability flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Capability set resolved once per request from the JWT claims.
///
/// A user can hold several roles at once (a librarian keeps the patron role
/// they were provisioned with), so this is a set of booleans rather than a
/// single tag.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct RoleSet {
    pub patron: bool,
    pub librarian: bool,
    pub admin: bool,
}

impl RoleSet {
    pub fn can_borrow(&self) -> bool {
        self.patron
    }

    pub fn can_moderate(&self) -> bool {
        self.librarian
    }

    pub fn can_manage_catalog(&self) -> bool {
        self.librarian
    }
}

/// Full user profile row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Object-store key of the profile picture, if any
    #[serde(skip_serializing)]
    pub picture_key: Option<String>,
    pub is_patron: bool,
    pub is_librarian: bool,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn roles(&self) -> RoleSet {
        RoleSet {
            patron: self.is_patron,
            librarian: self.is_librarian,
            admin: self.is_admin,
        }
    }

    /// Full name, falling back to the email address
    pub fn full_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.given_name.as_deref().unwrap_or(""),
            self.family_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    /// Given name, or the local part of the email address
    pub fn short_name(&self) -> String {
        match self.given_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

/// Short user representation for lists and request details
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub is_librarian: bool,
}

/// Update own profile request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub email: String,
    pub roles: RoleSet,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_librarian(&self) -> bool {
        self.roles.librarian
    }

    pub fn is_patron(&self) -> bool {
        self.roles.patron
    }

    pub fn is_admin(&self) -> bool {
        self.roles.admin
    }

    /// Require librarian privileges (catalogue management, moderation)
    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.roles.can_moderate() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian privileges required".to_string(),
            ))
        }
    }

    /// Require the patron capability (borrowing, borrow requests)
    pub fn require_patron(&self) -> Result<(), AppError> {
        if self.roles.can_borrow() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only patrons can borrow games".to_string(),
            ))
        }
    }

    /// Require that the claims refer to `user_id`, or librarian privileges
    pub fn require_self_or_librarian(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id || self.roles.can_moderate() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Not allowed to access another user's data".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(given: Option<&str>, family: Option<&str>) -> User {
        User {
            id: 1,
            email: "marianne@example.org".to_string(),
            given_name: given.map(String::from),
            family_name: family.map(String::from),
            picture_key: None,
            is_patron: true,
            is_librarian: false,
            is_admin: false,
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn full_name_falls_back_to_email() {
        assert_eq!(user(None, None).full_name(), "marianne@example.org");
        assert_eq!(
            user(Some("Marianne"), Some("Dubois")).full_name(),
            "Marianne Dubois"
        );
        assert_eq!(user(Some("Marianne"), None).full_name(), "Marianne");
    }

    #[test]
    fn short_name_uses_email_local_part() {
        assert_eq!(user(None, None).short_name(), "marianne");
        assert_eq!(user(Some("Mimi"), None).short_name(), "Mimi");
    }

    #[test]
    fn patron_cannot_moderate() {
        let roles = RoleSet {
            patron: true,
            librarian: false,
            admin: false,
        };
        assert!(roles.can_borrow());
        assert!(!roles.can_moderate());
        assert!(!roles.can_manage_catalog());
    }

    #[test]
    fn claims_guards() {
        let claims = UserClaims {
            sub: "marianne@example.org".to_string(),
            user_id: 1,
            email: "marianne@example.org".to_string(),
            roles: RoleSet {
                patron: true,
                librarian: false,
                admin: false,
            },
            exp: 0,
            iat: 0,
        };
        assert!(claims.require_patron().is_ok());
        assert!(claims.require_librarian().is_err());
        assert!(claims.require_self_or_librarian(1).is_ok());
        assert!(claims.require_self_or_librarian(2).is_err());
    }
}
