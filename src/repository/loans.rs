//! Loans repository for database operations
//!
//! Borrowing is the one place where two callers race for the same row: the
//! copy pick and the loan insert run in a single transaction, locking the
//! chosen copy with FOR UPDATE SKIP LOCKED so two borrows of the last copy
//! cannot both succeed. A partial unique index on loans(copy_id) WHERE NOT
//! returned backstops the invariant at the storage layer.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::CopyCondition,
        loan::{Loan, LoanDetails, LoanStatus},
    },
    repository::copies,
};

/// Outcome of a loan-creation attempt. Capacity violations are data, not
/// errors, because the approval workflow turns them into denials instead of
/// failing the moderation action.
#[derive(Debug, Clone)]
pub enum LoanAttempt {
    Created { loan_id: i32, due_date: DateTime<Utc> },
    NoCopyAvailable,
    MaxLoansReached { active: i64, max: i64 },
}

/// Pick an available copy of the game and create the loan, on the caller's
/// connection. The caller owns the transaction boundary.
pub async fn try_create_loan(
    conn: &mut PgConnection,
    user_id: i32,
    game_id: i32,
    period_days: i64,
    max_active: i64,
) -> AppResult<LoanAttempt> {
    // The row lock serializes concurrent borrows of the same copy; SKIP
    // LOCKED lets a parallel borrower take the next free copy instead of
    // queueing on this one.
    let copy_id: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT id FROM copies
        WHERE game_id = $1 AND is_available
        ORDER BY id
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .bind(game_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(copy_id) = copy_id else {
        return Ok(LoanAttempt::NoCopyAvailable);
    };

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND NOT returned",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    if active >= max_active {
        return Ok(LoanAttempt::MaxLoansReached {
            active,
            max: max_active,
        });
    }

    let now = Utc::now();
    let due_date = now + Duration::days(period_days);

    let loan_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO loans (user_id, copy_id, borrowed_on, due_date, returned, status)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(copy_id)
    .bind(now)
    .bind(due_date)
    .bind(LoanStatus::derive(false, due_date, now).as_code())
    .fetch_one(&mut *conn)
    .await?;

    copies::recompute_availability(conn, copy_id).await?;

    Ok(LoanAttempt::Created { loan_id, due_date })
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Borrow a copy of a game as one atomic unit
    pub async fn create_for_game(
        &self,
        user_id: i32,
        game_id: i32,
        period_days: i64,
        max_active: i64,
    ) -> AppResult<LoanAttempt> {
        let mut tx = self.pool.begin().await?;
        let attempt = try_create_loan(&mut *tx, user_id, game_id, period_days, max_active).await?;
        match attempt {
            LoanAttempt::Created { .. } => tx.commit().await?,
            _ => tx.rollback().await?,
        }
        Ok(attempt)
    }

    /// Return a loan; optionally records the copy's condition as observed at
    /// the return desk.
    pub async fn mark_returned(
        &self,
        loan_id: i32,
        new_condition: Option<CopyCondition>,
    ) -> AppResult<LoanDetails> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.returned {
            return Err(AppError::BusinessRule("Loan already returned".to_string()));
        }

        sqlx::query(
            r#"
            UPDATE loans
            SET returned = TRUE,
                returned_on = COALESCE(returned_on, NOW()),
                status = 'returned'
            WHERE id = $1
            "#,
        )
        .bind(loan_id)
        .execute(&mut *tx)
        .await?;

        if let Some(condition) = new_condition {
            sqlx::query("UPDATE copies SET condition = $1 WHERE id = $2")
                .bind(condition.as_code())
                .bind(loan.copy_id)
                .execute(&mut *tx)
                .await?;
        }

        copies::recompute_availability(&mut *tx, loan.copy_id).await?;

        tx.commit().await?;

        self.get_details(loan_id).await
    }

    /// Loan with game context, derived status filled against now
    pub async fn get_details(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let details = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.user_id, l.copy_id, cp.game_id, g.title as game_title,
                   cp.pickup_location, l.borrowed_on, l.due_date, l.returned, l.returned_on
            FROM loans l
            JOIN copies cp ON cp.id = l.copy_id
            JOIN games g ON g.id = cp.game_id
            WHERE l.id = $1
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        Ok(details.with_derived_status(Utc::now()))
    }

    /// Loans of a user, newest first; `active_only` restricts to unreturned
    pub async fn get_user_loans(
        &self,
        user_id: i32,
        active_only: bool,
    ) -> AppResult<Vec<LoanDetails>> {
        let filter = if active_only {
            "l.user_id = $1 AND NOT l.returned"
        } else {
            "l.user_id = $1"
        };
        let query = format!(
            r#"
            SELECT l.id, l.user_id, l.copy_id, cp.game_id, g.title as game_title,
                   cp.pickup_location, l.borrowed_on, l.due_date, l.returned, l.returned_on
            FROM loans l
            JOIN copies cp ON cp.id = l.copy_id
            JOIN games g ON g.id = cp.game_id
            WHERE {}
            ORDER BY l.borrowed_on DESC
            "#,
            filter
        );

        let loans = sqlx::query_as::<_, LoanDetails>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let now = Utc::now();
        Ok(loans
            .into_iter()
            .map(|l| l.with_derived_status(now))
            .collect())
    }

    /// Count of a user's unreturned loans
    pub async fn count_active_for_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE user_id = $1 AND NOT returned",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Whether the user ever borrowed a copy of the game
    pub async fn has_user_borrowed_game(&self, user_id: i32, game_id: i32) -> AppResult<bool> {
        let borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans l
                JOIN copies cp ON cp.id = l.copy_id
                WHERE l.user_id = $1 AND cp.game_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(borrowed)
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE NOT returned")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE NOT returned AND due_date < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
