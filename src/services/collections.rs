//! Collection management service

use crate::{
    error::{AppError, AppResult},
    models::{
        collection::{Collection, CollectionPayload, CollectionQuery},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CollectionsService {
    repository: Repository,
}

impl CollectionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List collections; anonymous callers see public ones only
    pub async fn list(
        &self,
        claims: Option<&UserClaims>,
        query: &CollectionQuery,
    ) -> AppResult<(Vec<Collection>, i64)> {
        self.repository
            .collections
            .list(query, claims.is_some())
            .await
    }

    /// Collection detail, gated by the access rule
    pub async fn get(&self, claims: Option<&UserClaims>, id: i32) -> AppResult<Collection> {
        let collection = self.repository.collections.get_by_id(id).await?;
        if !self.check_access(claims, &collection).await? {
            return Err(AppError::Authorization(
                "You don't have permission to view this private collection".to_string(),
            ));
        }
        Ok(collection)
    }

    /// Evaluate the access rule for one caller
    pub async fn check_access(
        &self,
        claims: Option<&UserClaims>,
        collection: &Collection,
    ) -> AppResult<bool> {
        let is_authorized = match claims {
            Some(claims) if collection.is_private() => {
                self.repository
                    .collections
                    .is_user_authorized(collection.id, claims.user_id)
                    .await?
            }
            _ => false,
        };
        Ok(collection.can_user_access(claims, is_authorized))
    }

    /// Create a collection and place its initial games.
    ///
    /// Placement goes through the locked membership operation game by game; a
    /// game that violates exclusivity is skipped rather than failing the
    /// whole creation (the original behaved the same way).
    pub async fn create(
        &self,
        claims: &UserClaims,
        payload: &CollectionPayload,
    ) -> AppResult<Collection> {
        let collection_id = self
            .repository
            .collections
            .create(claims.user_id, claims.roles, payload)
            .await?;

        let mut skipped = Vec::new();
        for game_id in &payload.game_ids {
            match self
                .repository
                .collections
                .add_game(collection_id, *game_id)
                .await
            {
                Ok(()) => {}
                Err(AppError::BusinessRule(_)) => skipped.push(*game_id),
                Err(e) => return Err(e),
            }
        }
        if !skipped.is_empty() {
            tracing::info!(
                "Collection {}: skipped games {:?} (placement exclusivity)",
                collection_id,
                skipped
            );
        }

        self.repository.collections.get_by_id(collection_id).await
    }

    /// Edit a collection; creator or librarian only. The member game set is
    /// replaced by the payload's games, re-checked game by game.
    pub async fn update(
        &self,
        claims: &UserClaims,
        id: i32,
        payload: &CollectionPayload,
    ) -> AppResult<Collection> {
        let collection = self.repository.collections.get_by_id(id).await?;
        self.require_owner_or_librarian(claims, &collection, "edit")?;

        self.repository.collections.update(id, payload).await?;

        self.repository.collections.clear_games(id).await?;
        for game_id in &payload.game_ids {
            // Re-adding under the lock re-applies eviction and exclusivity
            match self.repository.collections.add_game(id, *game_id).await {
                Ok(()) => {}
                Err(AppError::BusinessRule(_)) => {
                    tracing::info!(
                        "Collection {}: game {} rejected on edit (placement exclusivity)",
                        id,
                        game_id
                    );
                }
                Err(e) => return Err(e),
            }
        }

        self.repository.collections.get_by_id(id).await
    }

    /// Delete a collection; creator or librarian only
    pub async fn delete(&self, claims: &UserClaims, id: i32) -> AppResult<String> {
        let collection = self.repository.collections.get_by_id(id).await?;
        self.require_owner_or_librarian(claims, &collection, "delete")?;
        self.repository.collections.delete(id).await
    }

    /// Add one game; creator or librarian only
    pub async fn add_game(&self, claims: &UserClaims, id: i32, game_id: i32) -> AppResult<()> {
        let collection = self.repository.collections.get_by_id(id).await?;
        self.require_owner_or_librarian(claims, &collection, "edit")?;
        self.repository.collections.add_game(id, game_id).await
    }

    /// Remove one game; creator or librarian only
    pub async fn remove_game(&self, claims: &UserClaims, id: i32, game_id: i32) -> AppResult<()> {
        let collection = self.repository.collections.get_by_id(id).await?;
        self.require_owner_or_librarian(claims, &collection, "edit")?;
        self.repository.collections.remove_game(id, game_id).await
    }

    fn require_owner_or_librarian(
        &self,
        claims: &UserClaims,
        collection: &Collection,
        action: &str,
    ) -> AppResult<()> {
        if claims.user_id == collection.creator_id || claims.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "You don't have permission to {} this collection",
                action
            )))
        }
    }
}
