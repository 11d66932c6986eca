//! Review service

use crate::{
    error::AppResult,
    models::review::{Review, UpsertReview},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Reviews of a game with reviewer names
    pub async fn list_for_game(&self, game_id: i32) -> AppResult<Vec<Review>> {
        self.repository.reviews.list_for_game(game_id).await
    }

    /// Create or update the caller's review. Returns the review and whether
    /// it was newly created.
    pub async fn upsert(
        &self,
        user_id: i32,
        game_id: i32,
        review: &UpsertReview,
    ) -> AppResult<(Review, bool)> {
        self.repository.reviews.upsert(user_id, game_id, review).await
    }

    /// The caller's own review of a game, plus whether they ever borrowed it
    /// (the detail page distinguishes reviews from verified borrowers)
    pub async fn own_review_context(
        &self,
        user_id: i32,
        game_id: i32,
    ) -> AppResult<(Option<Review>, bool)> {
        let review = self
            .repository
            .reviews
            .get_for_user_and_game(user_id, game_id)
            .await?;
        let has_borrowed = self
            .repository
            .loans
            .has_user_borrowed_game(user_id, game_id)
            .await?;
        Ok((review, has_borrowed))
    }
}
