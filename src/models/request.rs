//! Borrow and collection-access request models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Moderation request states. `Approved` and `Denied` are terminal; a request
/// leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "denied" => Some(RequestStatus::Denied),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Borrow request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: i32,
    pub user_id: i32,
    pub game_id: i32,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Collection access request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CollectionAccessRequest {
    pub id: i32,
    pub user_id: i32,
    pub collection_id: i32,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Pending borrow request with requester/game context for the moderation list
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRequestDetails {
    pub id: i32,
    pub user_id: i32,
    pub user_email: String,
    pub game_id: i32,
    pub game_title: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

/// Pending access request with requester/collection context
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AccessRequestDetails {
    pub id: i32,
    pub user_id: i32,
    pub user_email: String,
    pub collection_id: i32,
    pub collection_title: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

/// Submit borrow request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitBorrowRequest {
    pub game_id: i32,
}

/// Outcome of a moderation decision
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DecisionOutcome {
    pub request_id: i32,
    pub status: RequestStatus,
    /// Reason reported when an approval was converted into a denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Loan created by an approved borrow request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Denied,
        ] {
            assert_eq!(RequestStatus::parse(status.as_code()), Some(status));
        }
        assert_eq!(RequestStatus::parse("Approved"), None);
    }
}
