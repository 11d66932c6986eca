//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateProfile, User, UserShort},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Update own profile fields
    pub async fn update_profile(&self, id: i32, update: &UpdateProfile) -> AppResult<User> {
        if let Some(ref email) = update.email {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id != $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            if taken {
                return Err(AppError::Conflict("Email address already in use".to_string()));
            }
        }

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET given_name = COALESCE($1, given_name),
                family_name = COALESCE($2, family_name),
                email = COALESCE($3, email)
            WHERE id = $4 AND is_active
            RETURNING *
            "#,
        )
        .bind(&update.given_name)
        .bind(&update.family_name)
        .bind(&update.email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Set the profile picture object key
    pub async fn set_picture_key(&self, id: i32, key: &str) -> AppResult<()> {
        let updated = sqlx::query("UPDATE users SET picture_key = $1 WHERE id = $2")
            .bind(key)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Grant the librarian role
    pub async fn promote_to_librarian(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_librarian = TRUE WHERE id = $1 AND is_active RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Users without the librarian role, for the promotion screen
    pub async fn list_non_librarians(&self) -> AppResult<Vec<UserShort>> {
        let users = sqlx::query_as::<_, UserShort>(
            r#"
            SELECT id, email, given_name, family_name, is_librarian
            FROM users
            WHERE NOT is_librarian AND is_active
            ORDER BY email
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
