//! Reviews repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::review::{Review, UpsertReview},
};

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// The caller's review of a game, if any
    pub async fn get_for_user_and_game(
        &self,
        user_id: i32,
        game_id: i32,
    ) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT *, NULL::text as reviewer_name FROM reviews WHERE user_id = $1 AND game_id = $2",
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    /// Reviews of a game with reviewer display names, newest first
    pub async fn list_for_game(&self, game_id: i32) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT r.*,
                   NULLIF(TRIM(CONCAT(u.given_name, ' ', u.family_name)), '') as reviewer_name
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.game_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    /// Create or update the (user, game) review.
    ///
    /// Read-before-write rather than catching the unique violation: an
    /// existing review is updated in place, so the pair's review count
    /// stays at one.
    pub async fn upsert(
        &self,
        user_id: i32,
        game_id: i32,
        review: &UpsertReview,
    ) -> AppResult<(Review, bool)> {
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

        let existing = self.get_for_user_and_game(user_id, game_id).await?;

        let (saved, created) = match existing {
            Some(current) => {
                let updated = sqlx::query_as::<_, Review>(
                    r#"
                    UPDATE reviews
                    SET rating = $1, title = $2, comment = $3, updated_at = NOW()
                    WHERE id = $4
                    RETURNING *, NULL::text as reviewer_name
                    "#,
                )
                .bind(review.rating)
                .bind(&review.title)
                .bind(&review.comment)
                .bind(current.id)
                .fetch_one(&self.pool)
                .await?;
                (updated, false)
            }
            None => {
                let inserted = sqlx::query_as::<_, Review>(
                    r#"
                    INSERT INTO reviews (user_id, game_id, rating, title, comment)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *, NULL::text as reviewer_name
                    "#,
                )
                .bind(user_id)
                .bind(game_id)
                .bind(review.rating)
                .bind(&review.title)
                .bind(&review.comment)
                .fetch_one(&self.pool)
                .await?;
                (inserted, true)
            }
        };

        Ok((saved, created))
    }
}
