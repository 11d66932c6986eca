//! Collections repository for database operations
//!
//! Game placement (one private collection XOR any number of public ones) is
//! not a storage-level constraint; every membership mutation for a game runs
//! under a transaction-scoped advisory lock keyed on the game id, so the
//! check-then-add sequence cannot interleave with a competing addition.

use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        collection::{can_add_game, Collection, CollectionPayload, CollectionQuery, Visibility},
        game::GameSummary,
        user::{RoleSet, UserShort},
    },
    repository::escape_like,
};

/// Lock class for pg_advisory_xact_lock(class, game_id)
const PLACEMENT_LOCK_CLASS: i32 = 1;

#[derive(Clone)]
pub struct CollectionsRepository {
    pool: Pool<Postgres>,
}

impl CollectionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get collection by ID with member games and authorized users
    pub async fn get_by_id(&self, id: i32) -> AppResult<Collection> {
        let mut collection = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collection with id {} not found", id)))?;

        collection.games = sqlx::query_as::<_, GameSummary>(
            r#"
            SELECT g.id, g.title, g.description, g.image_key,
                   g.min_players, g.max_players, g.playing_time, g.complexity,
                   COALESCE((SELECT COUNT(*) FROM copies cp WHERE cp.game_id = g.id), 0) as nb_copies,
                   COALESCE((SELECT COUNT(*) FROM copies cp WHERE cp.game_id = g.id AND cp.is_available), 0) as nb_available
            FROM collection_games cg
            JOIN games g ON g.id = cg.game_id
            WHERE cg.collection_id = $1
            ORDER BY g.title
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        collection.authorized_users = sqlx::query_as::<_, UserShort>(
            r#"
            SELECT u.id, u.email, u.given_name, u.family_name, u.is_librarian
            FROM collection_authorized_users cau
            JOIN users u ON u.id = cau.user_id
            WHERE cau.collection_id = $1
            ORDER BY u.email
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let creator_name: Option<String> = sqlx::query_scalar(
            "SELECT NULLIF(TRIM(CONCAT(given_name, ' ', family_name)), '') FROM users WHERE id = $1",
        )
        .bind(collection.creator_id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();
        collection.creator_name = creator_name;

        Ok(collection)
    }

    /// List collections with filters and pagination. Anonymous callers only
    /// see public collections; authenticated ones see every collection in the
    /// listing (access is enforced at detail time).
    pub async fn list(
        &self,
        query: &CollectionQuery,
        authenticated: bool,
    ) -> AppResult<(Vec<Collection>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = vec!["1=1".to_string()];

        if !authenticated {
            conditions.push("c.visibility = 'public'".to_string());
        }

        if let Some(ref search) = query.search {
            let term = escape_like(&search.to_lowercase());
            conditions.push(format!(
                "(LOWER(c.title) LIKE '%{t}%' OR LOWER(c.description) LIKE '%{t}%')",
                t = term
            ));
        }

        if let Some(ref visibility) = query.visibility {
            if let Some(v) = Visibility::parse(visibility) {
                conditions.push(format!("c.visibility = '{}'", v.as_code()));
            }
        }

        if let Some(creator) = query.creator {
            conditions.push(format!("c.creator_id = {}", creator));
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM collections c WHERE {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_query)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "SELECT c.* FROM collections c WHERE {} ORDER BY c.title LIMIT {} OFFSET {}",
            where_clause, per_page, offset
        );
        let collections = sqlx::query_as::<_, Collection>(&select_query)
            .fetch_all(&self.pool)
            .await?;

        Ok((collections, total))
    }

    /// Membership of the authorized-users set
    pub async fn is_user_authorized(&self, collection_id: i32, user_id: i32) -> AppResult<bool> {
        let authorized: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM collection_authorized_users WHERE collection_id = $1 AND user_id = $2)",
        )
        .bind(collection_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(authorized)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Create a collection. Visibility is coerced against the creator's roles
    /// before the row is written (patron-created collections are public no
    /// matter what was requested).
    pub async fn create(
        &self,
        creator_id: i32,
        creator_roles: RoleSet,
        payload: &CollectionPayload,
    ) -> AppResult<i32> {
        let visibility = payload.visibility.coerce_for_creator(creator_roles);

        let mut tx = self.pool.begin().await?;

        let collection_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO collections (title, description, creator_id, visibility)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(creator_id)
        .bind(visibility.as_code())
        .fetch_one(&mut *tx)
        .await?;

        for user_id in &payload.authorized_user_ids {
            sqlx::query(
                "INSERT INTO collection_authorized_users (collection_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(collection_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(collection_id)
    }

    /// Update title, description, visibility, and authorized users. The
    /// coercion re-applies on every edit using the creator's roles, so a
    /// patron's collection cannot be flipped private after the fact.
    pub async fn update(&self, id: i32, payload: &CollectionPayload) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let creator = sqlx::query(
            r#"
            SELECT u.is_patron, u.is_librarian, u.is_admin
            FROM collections c
            JOIN users u ON u.id = c.creator_id
            WHERE c.id = $1
            FOR UPDATE OF c
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collection with id {} not found", id)))?;

        let creator_roles = RoleSet {
            patron: creator.get("is_patron"),
            librarian: creator.get("is_librarian"),
            admin: creator.get("is_admin"),
        };
        let visibility = payload.visibility.coerce_for_creator(creator_roles);

        sqlx::query(
            r#"
            UPDATE collections
            SET title = $1, description = $2, visibility = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(visibility.as_code())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM collection_authorized_users WHERE collection_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for user_id in &payload.authorized_user_ids {
            sqlx::query(
                "INSERT INTO collection_authorized_users (collection_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Delete a collection; membership and authorization rows cascade
    pub async fn delete(&self, id: i32) -> AppResult<String> {
        let row = sqlx::query("DELETE FROM collections WHERE id = $1 RETURNING title")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Collection with id {} not found", id)))?;
        Ok(row.get("title"))
    }

    /// Add a game to a collection under the placement-exclusivity rule.
    ///
    /// When the target is private, the game is first evicted from every
    /// public collection it belongs to, inside the same locked transaction.
    pub async fn add_game(&self, collection_id: i32, game_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(PLACEMENT_LOCK_CLASS)
            .bind(game_id)
            .execute(&mut *tx)
            .await?;

        let visibility: String =
            sqlx::query_scalar("SELECT visibility FROM collections WHERE id = $1")
                .bind(collection_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Collection with id {} not found", collection_id))
                })?;
        let target = Visibility::parse(&visibility)
            .ok_or_else(|| AppError::Internal(format!("Bad visibility value '{}'", visibility)))?;

        let game_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM games WHERE id = $1)")
            .bind(game_id)
            .fetch_one(&mut *tx)
            .await?;
        if !game_exists {
            return Err(AppError::NotFound(format!(
                "Game with id {} not found",
                game_id
            )));
        }

        if target == Visibility::Private {
            sqlx::query(
                r#"
                DELETE FROM collection_games cg
                USING collections c
                WHERE c.id = cg.collection_id
                  AND cg.game_id = $1
                  AND c.visibility = 'public'
                "#,
            )
            .bind(game_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE c.visibility = 'private') as private_memberships,
                COUNT(*) FILTER (WHERE c.visibility = 'public') as public_memberships
            FROM collection_games cg
            JOIN collections c ON c.id = cg.collection_id
            WHERE cg.game_id = $1 AND cg.collection_id != $2
            "#,
        )
        .bind(game_id)
        .bind(collection_id)
        .fetch_one(&mut *tx)
        .await?;

        let private_memberships: i64 = row.get("private_memberships");
        let public_memberships: i64 = row.get("public_memberships");

        if !can_add_game(target, private_memberships, public_memberships) {
            return Err(AppError::BusinessRule(format!(
                "Game {} cannot join this {} collection: it already belongs to a {} collection",
                game_id,
                target,
                if private_memberships > 0 {
                    "private"
                } else {
                    "public"
                }
            )));
        }

        sqlx::query(
            "INSERT INTO collection_games (collection_id, game_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(collection_id)
        .bind(game_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Remove a game from a collection
    pub async fn remove_game(&self, collection_id: i32, game_id: i32) -> AppResult<()> {
        let removed = sqlx::query(
            "DELETE FROM collection_games WHERE collection_id = $1 AND game_id = $2",
        )
        .bind(collection_id)
        .bind(game_id)
        .execute(&self.pool)
        .await?;
        if removed.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Game {} is not in collection {}",
                game_id, collection_id
            )));
        }
        Ok(())
    }

    /// Drop every membership of a collection (used before re-adding the
    /// replacement game set on edit)
    pub async fn clear_games(&self, collection_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM collection_games WHERE collection_id = $1")
            .bind(collection_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Add a user to the authorized set (idempotent)
    pub async fn authorize_user(&self, collection_id: i32, user_id: i32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO collection_authorized_users (collection_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(collection_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
