//! Game review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Review row; unique per (user, game)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub game_id: i32,
    /// 1 to 5 stars
    pub rating: i16,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Display name of the reviewer, joined in for listings
    #[serde(default)]
    pub reviewer_name: Option<String>,
}

/// Submit review body. A second submission for the same (user, game) pair
/// updates the existing review in place.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertReview {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn rating_bounds_enforced() {
        let ok = UpsertReview {
            rating: 4,
            title: Some("Great game".to_string()),
            comment: None,
        };
        assert!(ok.validate().is_ok());

        let too_high = UpsertReview {
            rating: 6,
            title: None,
            comment: None,
        };
        assert!(too_high.validate().is_err());

        let too_low = UpsertReview {
            rating: 0,
            title: None,
            comment: None,
        };
        assert!(too_low.validate().is_err());
    }
}
