//! Requests repository for database operations
//!
//! Moderation transitions lock the request row and proceed only from
//! `pending`: two librarians deciding the same request concurrently cannot
//! both apply side effects — the loser sees a terminal status and gets an
//! already-processed conflict.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::request::{
        AccessRequestDetails, BorrowRequest, BorrowRequestDetails, CollectionAccessRequest,
        DecisionOutcome, RequestStatus,
    },
    repository::loans::{try_create_loan, LoanAttempt},
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// File a borrow request; at most one pending per (user, game)
    pub async fn create_borrow(&self, user_id: i32, game_id: i32) -> AppResult<BorrowRequest> {
        let game_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM games WHERE id = $1)")
            .bind(game_id)
            .fetch_one(&self.pool)
            .await?;
        if !game_exists {
            return Err(AppError::NotFound(format!(
                "Game with id {} not found",
                game_id
            )));
        }

        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrow_requests WHERE user_id = $1 AND game_id = $2 AND status = 'pending')",
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;
        if pending {
            return Err(AppError::Conflict(
                "You already have a pending borrow request for this game".to_string(),
            ));
        }

        let request = sqlx::query_as::<_, BorrowRequest>(
            r#"
            INSERT INTO borrow_requests (user_id, game_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    /// File a collection access request; at most one pending per (user, collection)
    pub async fn create_access(
        &self,
        user_id: i32,
        collection_id: i32,
    ) -> AppResult<CollectionAccessRequest> {
        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM collection_access_requests WHERE user_id = $1 AND collection_id = $2 AND status = 'pending')",
        )
        .bind(user_id)
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await?;
        if pending {
            return Err(AppError::Conflict(
                "You already have a pending access request for this collection".to_string(),
            ));
        }

        let request = sqlx::query_as::<_, CollectionAccessRequest>(
            r#"
            INSERT INTO collection_access_requests (user_id, collection_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    // =========================================================================
    // LISTINGS
    // =========================================================================

    /// Pending borrow requests with requester and game context
    pub async fn list_pending_borrow(&self) -> AppResult<Vec<BorrowRequestDetails>> {
        let requests = sqlx::query_as::<_, BorrowRequestDetails>(
            r#"
            SELECT br.id, br.user_id, u.email as user_email,
                   br.game_id, g.title as game_title, br.status, br.requested_at
            FROM borrow_requests br
            JOIN users u ON u.id = br.user_id
            JOIN games g ON g.id = br.game_id
            WHERE br.status = 'pending'
            ORDER BY br.requested_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// Pending collection access requests with requester and collection context
    pub async fn list_pending_access(&self) -> AppResult<Vec<AccessRequestDetails>> {
        let requests = sqlx::query_as::<_, AccessRequestDetails>(
            r#"
            SELECT car.id, car.user_id, u.email as user_email,
                   car.collection_id, c.title as collection_title, car.status, car.requested_at
            FROM collection_access_requests car
            JOIN users u ON u.id = car.user_id
            JOIN collections c ON c.id = car.collection_id
            WHERE car.status = 'pending'
            ORDER BY car.requested_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// A user's own borrow requests, newest first
    pub async fn list_user_borrow(&self, user_id: i32) -> AppResult<Vec<BorrowRequestDetails>> {
        let requests = sqlx::query_as::<_, BorrowRequestDetails>(
            r#"
            SELECT br.id, br.user_id, u.email as user_email,
                   br.game_id, g.title as game_title, br.status, br.requested_at
            FROM borrow_requests br
            JOIN users u ON u.id = br.user_id
            JOIN games g ON g.id = br.game_id
            WHERE br.user_id = $1
            ORDER BY br.requested_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// A user's own access requests, newest first
    pub async fn list_user_access(&self, user_id: i32) -> AppResult<Vec<AccessRequestDetails>> {
        let requests = sqlx::query_as::<_, AccessRequestDetails>(
            r#"
            SELECT car.id, car.user_id, u.email as user_email,
                   car.collection_id, c.title as collection_title, car.status, car.requested_at
            FROM collection_access_requests car
            JOIN users u ON u.id = car.user_id
            JOIN collections c ON c.id = car.collection_id
            WHERE car.user_id = $1
            ORDER BY car.requested_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    // =========================================================================
    // MODERATION
    // =========================================================================

    /// Lock a borrow request row and require it to still be pending
    async fn lock_pending_borrow(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        request_id: i32,
    ) -> AppResult<BorrowRequest> {
        let request = sqlx::query_as::<_, BorrowRequest>(
            "SELECT * FROM borrow_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Borrow request with id {} not found", request_id))
        })?;

        if request.status != RequestStatus::Pending.as_code() {
            return Err(AppError::Conflict(format!(
                "Borrow request {} was already processed ({})",
                request_id, request.status
            )));
        }

        Ok(request)
    }

    /// Approve a borrow request. The loan cap and copy availability are
    /// re-validated here — the world may have drifted since the request was
    /// filed — and a violation converts the approval into a denial with the
    /// specific reason. Loan creation and the status transition commit
    /// together or not at all.
    pub async fn approve_borrow(
        &self,
        request_id: i32,
        period_days: i64,
        max_active: i64,
    ) -> AppResult<DecisionOutcome> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_pending_borrow(&mut tx, request_id).await?;

        let attempt = try_create_loan(
            &mut *tx,
            request.user_id,
            request.game_id,
            period_days,
            max_active,
        )
        .await?;

        let outcome = match attempt {
            LoanAttempt::Created { loan_id, .. } => {
                sqlx::query(
                    "UPDATE borrow_requests SET status = 'approved', decided_at = $1 WHERE id = $2",
                )
                .bind(Utc::now())
                .bind(request_id)
                .execute(&mut *tx)
                .await?;
                DecisionOutcome {
                    request_id,
                    status: RequestStatus::Approved,
                    reason: None,
                    loan_id: Some(loan_id),
                }
            }
            LoanAttempt::NoCopyAvailable => {
                sqlx::query(
                    "UPDATE borrow_requests SET status = 'denied', decided_at = $1 WHERE id = $2",
                )
                .bind(Utc::now())
                .bind(request_id)
                .execute(&mut *tx)
                .await?;
                DecisionOutcome {
                    request_id,
                    status: RequestStatus::Denied,
                    reason: Some("No available copies of the requested game".to_string()),
                    loan_id: None,
                }
            }
            LoanAttempt::MaxLoansReached { active, max } => {
                sqlx::query(
                    "UPDATE borrow_requests SET status = 'denied', decided_at = $1 WHERE id = $2",
                )
                .bind(Utc::now())
                .bind(request_id)
                .execute(&mut *tx)
                .await?;
                DecisionOutcome {
                    request_id,
                    status: RequestStatus::Denied,
                    reason: Some(format!(
                        "Borrower has reached the maximum of {} simultaneous loans ({} active)",
                        max, active
                    )),
                    loan_id: None,
                }
            }
        };

        tx.commit().await?;

        Ok(outcome)
    }

    /// Deny a borrow request
    pub async fn deny_borrow(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        let mut tx = self.pool.begin().await?;

        Self::lock_pending_borrow(&mut tx, request_id).await?;

        sqlx::query("UPDATE borrow_requests SET status = 'denied', decided_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(request_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DecisionOutcome {
            request_id,
            status: RequestStatus::Denied,
            reason: None,
            loan_id: None,
        })
    }

    /// Lock an access request row and require it to still be pending
    async fn lock_pending_access(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        request_id: i32,
    ) -> AppResult<CollectionAccessRequest> {
        let request = sqlx::query_as::<_, CollectionAccessRequest>(
            "SELECT * FROM collection_access_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Access request with id {} not found", request_id))
        })?;

        if request.status != RequestStatus::Pending.as_code() {
            return Err(AppError::Conflict(format!(
                "Access request {} was already processed ({})",
                request_id, request.status
            )));
        }

        Ok(request)
    }

    /// Approve an access request: add the requester to the authorized set
    /// (idempotent) and mark the request approved, atomically.
    pub async fn approve_access(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_pending_access(&mut tx, request_id).await?;

        sqlx::query(
            "INSERT INTO collection_authorized_users (collection_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(request.collection_id)
        .bind(request.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE collection_access_requests SET status = 'approved', decided_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DecisionOutcome {
            request_id,
            status: RequestStatus::Approved,
            reason: None,
            loan_id: None,
        })
    }

    /// Deny an access request
    pub async fn deny_access(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        let mut tx = self.pool.begin().await?;

        Self::lock_pending_access(&mut tx, request_id).await?;

        sqlx::query(
            "UPDATE collection_access_requests SET status = 'denied', decided_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DecisionOutcome {
            request_id,
            status: RequestStatus::Denied,
            reason: None,
            loan_id: None,
        })
    }
}
