//! Board game and category models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::copy::{GameCopy, PickupLocation};
use super::review::Review;

/// Game category/genre
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Full board game model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BoardGame {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub image_key: Option<String>,
    pub min_players: i16,
    pub max_players: i16,
    /// Average playing time in minutes
    pub playing_time: Option<i32>,
    /// Complexity from 1 (simple) to 5 (complex)
    pub complexity: Option<i16>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub categories: Vec<Category>,
    #[sqlx(skip)]
    #[serde(default)]
    pub copies: Vec<GameCopy>,
    #[sqlx(skip)]
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Signed display URL, or the configured placeholder
    #[sqlx(skip)]
    #[serde(default)]
    pub image_url: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub available_copies: i64,
    /// Mean review rating to 1 decimal; absent when the game has no reviews
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
}

impl BoardGame {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Round a mean rating to one decimal.
///
/// Returns None for an empty rating set — "no reviews" and "rated 0" must
/// stay distinguishable downstream.
pub fn average_rating(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Short game representation for catalogue lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GameSummary {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub image_key: Option<String>,
    pub min_players: i16,
    pub max_players: i16,
    pub playing_time: Option<i32>,
    pub complexity: Option<i16>,
    pub nb_copies: i64,
    pub nb_available: i64,
    #[sqlx(skip)]
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Create/update game request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GamePayload {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "min_players must be at least 1"))]
    pub min_players: i16,
    #[validate(range(min = 1, message = "max_players must be at least 1"))]
    pub max_players: i16,
    #[validate(range(min = 1, max = 10000, message = "Playing time must be 1-10000 minutes"))]
    pub playing_time: Option<i32>,
    #[validate(range(min = 1, max = 5, message = "Complexity must be between 1 and 5"))]
    pub complexity: Option<i16>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
    /// Target number of physical copies; missing copies are provisioned
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub num_copies: Option<i32>,
    /// Location assigned to provisioned copies
    pub default_pickup_location: Option<PickupLocation>,
}

impl GamePayload {
    /// Cross-field check the derive cannot express
    pub fn check_player_range(&self) -> Result<(), crate::error::AppError> {
        if self.min_players > self.max_players {
            return Err(crate::error::AppError::Validation(
                "min_players cannot exceed max_players".to_string(),
            ));
        }
        Ok(())
    }
}

/// Catalogue query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct GameQuery {
    /// Free text over title, description and category names
    pub search: Option<String>,
    pub category: Option<String>,
    pub complexity: Option<i16>,
    /// Player count that must fit within min/max players
    pub players: Option<i16>,
    /// "available" restricts to games with at least one free copy
    pub availability: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_rating_none_without_reviews() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn average_rating_rounds_to_one_decimal() {
        assert_eq!(average_rating(&[4]), Some(4.0));
        assert_eq!(average_rating(&[4, 5]), Some(4.5));
        assert_eq!(average_rating(&[3, 4, 4]), Some(3.7));
        assert_eq!(average_rating(&[1, 1, 1]), Some(1.0));
    }

    #[test]
    fn player_range_check() {
        let mut payload = GamePayload {
            title: "Catan".to_string(),
            description: None,
            min_players: 3,
            max_players: 4,
            playing_time: Some(60),
            complexity: Some(2),
            category_ids: vec![],
            num_copies: Some(1),
            default_pickup_location: None,
        };
        assert!(payload.check_player_range().is_ok());
        payload.min_players = 5;
        assert!(payload.check_player_range().is_err());
    }
}
