//! Loan model and status derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::copy::CopyCondition;

/// Loan lifecycle states.
///
/// `Overdue` is time-derived, never an explicit transition; `Returned` is
/// terminal and only entered through an explicit return action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
    Overdue,
}

impl LoanStatus {
    /// Derive the status from the underlying facts. The stored column is a
    /// denormalized convenience; this function is the source of truth.
    pub fn derive(returned: bool, due_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if returned {
            LoanStatus::Returned
        } else if due_date < now {
            LoanStatus::Overdue
        } else {
            LoanStatus::Borrowed
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Loan row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub copy_id: i32,
    pub borrowed_on: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
    pub returned_on: Option<DateTime<Utc>>,
    pub status: String,
}

impl Loan {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.returned && self.due_date < now
    }
}

/// Loan with game/copy context for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub user_id: i32,
    pub copy_id: i32,
    pub game_id: i32,
    pub game_title: String,
    pub pickup_location: String,
    pub borrowed_on: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
    pub returned_on: Option<DateTime<Utc>>,
    /// Recomputed at read time, not read from the stored column
    #[sqlx(skip)]
    #[serde(default)]
    pub status: Option<LoanStatus>,
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl LoanDetails {
    /// Fill the derived fields against `now`
    pub fn with_derived_status(mut self, now: DateTime<Utc>) -> Self {
        let status = LoanStatus::derive(self.returned, self.due_date, now);
        self.is_overdue = status == LoanStatus::Overdue;
        self.status = Some(status);
        self
    }
}

/// Borrow request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct BorrowGame {
    pub game_id: i32,
}

/// Return request body
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReturnLoan {
    /// Updated copy condition observed at return, if the librarian recorded one
    pub condition: Option<CopyCondition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_borrowed_before_due_date() {
        let now = Utc::now();
        let due = now + Duration::days(14);
        assert_eq!(LoanStatus::derive(false, due, now), LoanStatus::Borrowed);
    }

    #[test]
    fn status_overdue_after_due_date() {
        let now = Utc::now();
        let due = now - Duration::days(1);
        assert_eq!(LoanStatus::derive(false, due, now), LoanStatus::Overdue);
    }

    #[test]
    fn returned_wins_over_overdue() {
        let now = Utc::now();
        let due = now - Duration::days(30);
        assert_eq!(LoanStatus::derive(true, due, now), LoanStatus::Returned);
    }

    #[test]
    fn overdue_predicate_matches_derivation() {
        let now = Utc::now();
        let loan = Loan {
            id: 1,
            user_id: 1,
            copy_id: 1,
            borrowed_on: now - Duration::days(20),
            due_date: now - Duration::days(6),
            returned: false,
            returned_on: None,
            status: "borrowed".to_string(),
        };
        assert!(loan.is_overdue(now));

        let returned = Loan {
            returned: true,
            ..loan
        };
        assert!(!returned.is_overdue(now));
    }

    #[test]
    fn details_derive_overdue_on_read() {
        let now = Utc::now();
        let details = LoanDetails {
            id: 1,
            user_id: 1,
            copy_id: 1,
            game_id: 1,
            game_title: "Catan".to_string(),
            pickup_location: "shannon".to_string(),
            borrowed_on: now - Duration::days(20),
            due_date: now - Duration::days(6),
            returned: false,
            returned_on: None,
            status: None,
            is_overdue: false,
        }
        .with_derived_status(now);
        assert_eq!(details.status, Some(LoanStatus::Overdue));
        assert!(details.is_overdue);
    }
}
