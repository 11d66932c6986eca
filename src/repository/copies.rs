//! Copies repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::copy::{CreateCopy, GameCopy, UpdateCopy},
};

/// Re-derive `is_available` for a copy from the loans table.
///
/// Queries active-loan existence instead of trusting the cached flag, so
/// concurrent returns converge on the same answer. Runs on the caller's
/// connection so loan transitions can include it in their transaction.
pub async fn recompute_availability(conn: &mut PgConnection, copy_id: i32) -> AppResult<bool> {
    let available: bool = sqlx::query_scalar(
        r#"
        UPDATE copies
        SET is_available = NOT EXISTS (
            SELECT 1 FROM loans WHERE copy_id = $1 AND NOT returned
        )
        WHERE id = $1
        RETURNING is_available
        "#,
    )
    .bind(copy_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", copy_id)))?;

    Ok(available)
}

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get copy by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<GameCopy> {
        sqlx::query_as::<_, GameCopy>("SELECT * FROM copies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", id)))
    }

    /// List copies of a game
    pub async fn list_for_game(&self, game_id: i32) -> AppResult<Vec<GameCopy>> {
        let copies = sqlx::query_as::<_, GameCopy>(
            "SELECT * FROM copies WHERE game_id = $1 ORDER BY id",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Add a copy to a game
    pub async fn create(&self, game_id: i32, create: &CreateCopy) -> AppResult<GameCopy> {
        let game_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM games WHERE id = $1)")
            .bind(game_id)
            .fetch_one(&self.pool)
            .await?;
        if !game_exists {
            return Err(AppError::NotFound(format!(
                "Game with id {} not found",
                game_id
            )));
        }

        let copy = sqlx::query_as::<_, GameCopy>(
            r#"
            INSERT INTO copies (game_id, condition, pickup_location, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(game_id)
        .bind(create.condition.unwrap_or_default().as_code())
        .bind(create.pickup_location.unwrap_or_default().as_code())
        .bind(&create.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(copy)
    }

    /// Update condition, location, or notes of a copy
    pub async fn update(&self, id: i32, update: &UpdateCopy) -> AppResult<GameCopy> {
        sqlx::query_as::<_, GameCopy>(
            r#"
            UPDATE copies
            SET condition = COALESCE($1, condition),
                pickup_location = COALESCE($2, pickup_location),
                notes = COALESCE($3, notes)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(update.condition.map(|c| c.as_code()))
        .bind(update.pickup_location.map(|l| l.as_code()))
        .bind(&update.notes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", id)))
    }

    /// Remove a copy. Copies with an active loan cannot be removed.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE copy_id = $1 AND NOT returned)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if on_loan {
            return Err(AppError::BusinessRule(
                "Cannot remove a copy that is currently on loan".to_string(),
            ));
        }

        let deleted = sqlx::query("DELETE FROM copies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Copy with id {} not found", id)));
        }
        Ok(())
    }
}
