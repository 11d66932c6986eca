//! Catalogue management service

use crate::{
    error::AppResult,
    models::{
        copy::{CreateCopy, GameCopy, UpdateCopy},
        game::{BoardGame, Category, GamePayload, GameQuery, GameSummary},
    },
    repository::Repository,
    services::media::MediaService,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    media: MediaService,
}

impl CatalogService {
    pub fn new(repository: Repository, media: MediaService) -> Self {
        Self { repository, media }
    }

    /// Search the public catalogue with filters
    pub async fn search_games(&self, query: &GameQuery) -> AppResult<(Vec<GameSummary>, i64)> {
        let (mut games, total) = self.repository.games.search(query).await?;
        for game in &mut games {
            game.image_url = Some(self.media.game_image_url(game.image_key.as_deref()));
        }
        Ok((games, total))
    }

    /// Get game by ID with full details
    pub async fn get_game(&self, id: i32) -> AppResult<BoardGame> {
        let mut game = self.repository.games.get_by_id(id).await?;
        game.image_url = Some(self.media.game_image_url(game.image_key.as_deref()));
        Ok(game)
    }

    /// All categories
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.games.list_categories().await
    }

    /// Create a game with its initial copies
    pub async fn create_game(&self, payload: &GamePayload) -> AppResult<BoardGame> {
        payload.check_player_range()?;
        let game = self.repository.games.create(payload).await?;
        tracing::info!(
            "Catalogue: created game '{}' (id={}) with {} copies",
            game.title,
            game.id,
            game.copies.len()
        );
        Ok(game)
    }

    /// Update a game, topping up copies if requested
    pub async fn update_game(&self, id: i32, payload: &GamePayload) -> AppResult<BoardGame> {
        payload.check_player_range()?;
        self.repository.games.update(id, payload).await
    }

    /// Delete a game and everything it owns
    pub async fn delete_game(&self, id: i32) -> AppResult<String> {
        let title = self.repository.games.delete(id).await?;
        tracing::info!("Catalogue: deleted game '{}' (id={})", title, id);
        Ok(title)
    }

    /// Attach an uploaded image to a game, returning the signed display URL
    pub async fn attach_game_image(&self, id: i32, filename: &str, bytes: &[u8]) -> AppResult<String> {
        // Verify the game exists before touching the store
        self.repository.games.get_by_id(id).await?;
        let key = self.media.mint_key("board_games", filename);
        self.media.store(&key, bytes).await?;
        self.repository.games.set_image_key(id, &key).await?;
        Ok(self.media.game_image_url(Some(&key)))
    }

    /// Copies of a game
    pub async fn list_copies(&self, game_id: i32) -> AppResult<Vec<GameCopy>> {
        self.repository.copies.list_for_game(game_id).await
    }

    /// Add a copy
    pub async fn create_copy(&self, game_id: i32, create: &CreateCopy) -> AppResult<GameCopy> {
        self.repository.copies.create(game_id, create).await
    }

    /// Update a copy
    pub async fn update_copy(&self, id: i32, update: &UpdateCopy) -> AppResult<GameCopy> {
        self.repository.copies.update(id, update).await
    }

    /// Remove a copy
    pub async fn delete_copy(&self, id: i32) -> AppResult<()> {
        self.repository.copies.delete(id).await
    }
}
