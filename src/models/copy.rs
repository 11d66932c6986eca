//! Physical game copy model and related enums
//!
//! DB stores conditions and pickup locations as their string codes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Physical condition of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CopyCondition {
    New,
    Excellent,
    Good,
    Fair,
    Poor,
    Damaged,
}

impl CopyCondition {
    pub fn as_code(&self) -> &'static str {
        match self {
            CopyCondition::New => "new",
            CopyCondition::Excellent => "excellent",
            CopyCondition::Good => "good",
            CopyCondition::Fair => "fair",
            CopyCondition::Poor => "poor",
            CopyCondition::Damaged => "damaged",
        }
    }

    /// Parse a condition code; unrecognized values are rejected rather than
    /// defaulted so a bad return payload cannot silently degrade a copy.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(CopyCondition::New),
            "excellent" => Some(CopyCondition::Excellent),
            "good" => Some(CopyCondition::Good),
            "fair" => Some(CopyCondition::Fair),
            "poor" => Some(CopyCondition::Poor),
            "damaged" => Some(CopyCondition::Damaged),
            _ => None,
        }
    }
}

impl Default for CopyCondition {
    fn default() -> Self {
        CopyCondition::Good
    }
}

impl std::fmt::Display for CopyCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Library branch where a copy can be picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PickupLocation {
    Shannon,
    Clark,
    Clemons,
}

impl PickupLocation {
    pub fn as_code(&self) -> &'static str {
        match self {
            PickupLocation::Shannon => "shannon",
            PickupLocation::Clark => "clark",
            PickupLocation::Clemons => "clemons",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shannon" => Some(PickupLocation::Shannon),
            "clark" => Some(PickupLocation::Clark),
            "clemons" => Some(PickupLocation::Clemons),
            _ => None,
        }
    }
}

impl Default for PickupLocation {
    fn default() -> Self {
        PickupLocation::Shannon
    }
}

impl std::fmt::Display for PickupLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Physical copy of a board game
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GameCopy {
    pub id: i32,
    pub game_id: i32,
    pub acquisition_date: NaiveDate,
    pub condition: String,
    pub pickup_location: String,
    pub notes: Option<String>,
    /// Always the negation of "an unreturned loan exists for this copy";
    /// recomputed at loan transitions, never set directly.
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCopy {
    pub condition: Option<CopyCondition>,
    pub pickup_location: Option<PickupLocation>,
    pub notes: Option<String>,
}

/// Update copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCopy {
    pub condition: Option<CopyCondition>,
    pub pickup_location: Option<PickupLocation>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_codes_round_trip() {
        for cond in [
            CopyCondition::New,
            CopyCondition::Excellent,
            CopyCondition::Good,
            CopyCondition::Fair,
            CopyCondition::Poor,
            CopyCondition::Damaged,
        ] {
            assert_eq!(CopyCondition::parse(cond.as_code()), Some(cond));
        }
        assert_eq!(CopyCondition::parse("mint"), None);
    }

    #[test]
    fn location_parse_rejects_unknown_branch() {
        assert_eq!(PickupLocation::parse("clark"), Some(PickupLocation::Clark));
        assert_eq!(PickupLocation::parse("alderman"), None);
    }
}
