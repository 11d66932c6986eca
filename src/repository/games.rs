//! Games repository for database operations

use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::PickupLocation,
        game::{average_rating, BoardGame, Category, GamePayload, GameQuery, GameSummary},
    },
    repository::escape_like,
};

#[derive(Clone)]
pub struct GamesRepository {
    pool: Pool<Postgres>,
}

impl GamesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get game by ID with categories, copies, reviews, and derived fields
    pub async fn get_by_id(&self, id: i32) -> AppResult<BoardGame> {
        let mut game = sqlx::query_as::<_, BoardGame>("SELECT * FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Game with id {} not found", id)))?;

        game.categories = self.get_categories(id).await?;

        game.copies = sqlx::query_as(
            "SELECT * FROM copies WHERE game_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        game.reviews = sqlx::query_as(
            r#"
            SELECT r.*, NULL::text as reviewer_name
            FROM reviews r
            WHERE r.game_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        game.available_copies = game.copies.iter().filter(|c| c.is_available).count() as i64;

        let ratings: Vec<i16> = game.reviews.iter().map(|r| r.rating).collect();
        game.average_rating = average_rating(&ratings);

        Ok(game)
    }

    /// Count of copies with is_available for a game
    pub async fn available_copies_count(&self, game_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM copies WHERE game_id = $1 AND is_available",
        )
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn get_categories(&self, game_id: i32) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.description
            FROM game_categories gc
            JOIN categories c ON c.id = gc.category_id
            WHERE gc.game_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// All categories for filter dropdowns
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Catalogue search with pagination.
    ///
    /// Games belonging to any private collection are excluded from the public
    /// catalogue, whoever is asking; they surface only through their collection.
    pub async fn search(&self, query: &GameQuery) -> AppResult<(Vec<GameSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec![
            r#"NOT EXISTS (
                SELECT 1 FROM collection_games cg
                JOIN collections c ON c.id = cg.collection_id
                WHERE cg.game_id = g.id AND c.visibility = 'private'
            )"#
            .to_string(),
        ];

        if let Some(ref search) = query.search {
            let term = escape_like(&search.to_lowercase());
            conditions.push(format!(
                "(LOWER(g.title) LIKE '%{t}%' OR LOWER(g.description) LIKE '%{t}%' \
                 OR EXISTS (SELECT 1 FROM game_categories gc JOIN categories c ON c.id = gc.category_id \
                            WHERE gc.game_id = g.id AND LOWER(c.name) LIKE '%{t}%'))",
                t = term
            ));
        }

        if let Some(complexity) = query.complexity {
            conditions.push(format!("g.complexity = {}", complexity));
        }

        if let Some(players) = query.players {
            conditions.push(format!(
                "g.min_players <= {p} AND g.max_players >= {p}",
                p = players
            ));
        }

        if query.availability.as_deref() == Some("available") {
            conditions.push(
                "EXISTS (SELECT 1 FROM copies cp WHERE cp.game_id = g.id AND cp.is_available)"
                    .to_string(),
            );
        }

        if let Some(ref category) = query.category {
            let name = escape_like(category);
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM game_categories gc JOIN categories c ON c.id = gc.category_id \
                 WHERE gc.game_id = g.id AND c.name = '{}')",
                name
            ));
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM games g WHERE {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_query)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            r#"
            SELECT g.id, g.title, g.description, g.image_key,
                   g.min_players, g.max_players, g.playing_time, g.complexity,
                   COALESCE((SELECT COUNT(*) FROM copies cp WHERE cp.game_id = g.id), 0) as nb_copies,
                   COALESCE((SELECT COUNT(*) FROM copies cp WHERE cp.game_id = g.id AND cp.is_available), 0) as nb_available
            FROM games g
            WHERE {}
            ORDER BY g.title
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let games = sqlx::query_as::<_, GameSummary>(&select_query)
            .fetch_all(&self.pool)
            .await?;

        Ok((games, total))
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Create a game with its category set and initial copies
    pub async fn create(&self, payload: &GamePayload) -> AppResult<BoardGame> {
        let mut tx = self.pool.begin().await?;

        let game_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO games (title, description, min_players, max_players, playing_time, complexity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.min_players)
        .bind(payload.max_players)
        .bind(payload.playing_time)
        .bind(payload.complexity)
        .fetch_one(&mut *tx)
        .await?;

        for category_id in &payload.category_ids {
            sqlx::query(
                "INSERT INTO game_categories (game_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(game_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        let location = payload.default_pickup_location.unwrap_or_default();
        let num_copies = payload.num_copies.unwrap_or(1).max(1);
        for _ in 0..num_copies {
            sqlx::query(
                "INSERT INTO copies (game_id, condition, pickup_location) VALUES ($1, 'good', $2)",
            )
            .bind(game_id)
            .bind(location.as_code())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(game_id).await
    }

    /// Update a game; replaces the category set, moves existing copies to the
    /// default pickup location, and tops copies up to `num_copies`.
    pub async fn update(&self, id: i32, payload: &GamePayload) -> AppResult<BoardGame> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE games
            SET title = $1, description = $2, min_players = $3, max_players = $4,
                playing_time = $5, complexity = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.min_players)
        .bind(payload.max_players)
        .bind(payload.playing_time)
        .bind(payload.complexity)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Game with id {} not found", id)));
        }

        sqlx::query("DELETE FROM game_categories WHERE game_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for category_id in &payload.category_ids {
            sqlx::query(
                "INSERT INTO game_categories (game_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(location) = payload.default_pickup_location {
            sqlx::query("UPDATE copies SET pickup_location = $1 WHERE game_id = $2")
                .bind(location.as_code())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(num_copies) = payload.num_copies {
            let current: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM copies WHERE game_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            let location = payload
                .default_pickup_location
                .unwrap_or(PickupLocation::Shannon);
            for _ in current..num_copies as i64 {
                sqlx::query(
                    "INSERT INTO copies (game_id, condition, pickup_location) VALUES ($1, 'good', $2)",
                )
                .bind(id)
                .bind(location.as_code())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Set the catalogue image object key
    pub async fn set_image_key(&self, id: i32, key: &str) -> AppResult<()> {
        let updated = sqlx::query("UPDATE games SET image_key = $1, updated_at = NOW() WHERE id = $2")
            .bind(key)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Game with id {} not found", id)));
        }
        Ok(())
    }

    /// Delete a game; copies and loan history cascade
    pub async fn delete(&self, id: i32) -> AppResult<String> {
        let row = sqlx::query("DELETE FROM games WHERE id = $1 RETURNING title")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Game with id {} not found", id)))?;
        Ok(row.get("title"))
    }
}
