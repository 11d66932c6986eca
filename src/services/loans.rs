//! Loan management service

use crate::{
    config::LoanConfig,
    error::{AppError, AppResult},
    models::{
        copy::CopyCondition,
        loan::LoanDetails,
        user::UserClaims,
    },
    repository::{loans::LoanAttempt, Repository},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoanConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoanConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a game for the calling patron.
    ///
    /// The availability precondition and the loan cap are checked inside the
    /// borrow transaction — the two cannot drift between check and insert.
    pub async fn borrow_game(&self, claims: &UserClaims, game_id: i32) -> AppResult<LoanDetails> {
        claims.require_patron()?;

        // Surfaces a not-found for stale ids before any business check
        let game = self.repository.games.get_by_id(game_id).await?;

        let attempt = self
            .repository
            .loans
            .create_for_game(
                claims.user_id,
                game_id,
                self.config.period_days,
                self.config.max_active,
            )
            .await?;

        match attempt {
            LoanAttempt::Created { loan_id, .. } => {
                tracing::info!(
                    "Loan {}: user {} borrowed '{}'",
                    loan_id,
                    claims.user_id,
                    game.title
                );
                self.repository.loans.get_details(loan_id).await
            }
            LoanAttempt::NoCopyAvailable => Err(AppError::BusinessRule(format!(
                "All copies of '{}' are currently borrowed",
                game.title
            ))),
            LoanAttempt::MaxLoansReached { max, .. } => Err(AppError::BusinessRule(format!(
                "You have reached the maximum limit of {} borrowed games. Please return a game before borrowing another.",
                max
            ))),
        }
    }

    /// Return a loan. Borrowers return their own loans; librarians can
    /// return any loan and record the copy's observed condition.
    pub async fn return_loan(
        &self,
        claims: &UserClaims,
        loan_id: i32,
        condition: Option<CopyCondition>,
    ) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        if loan.user_id != claims.user_id && !claims.is_librarian() {
            return Err(AppError::Authorization(
                "Only the borrower or a librarian can return this loan".to_string(),
            ));
        }

        // Condition updates are a return-desk call, not self-service
        let condition = if claims.is_librarian() { condition } else { None };

        let details = self.repository.loans.mark_returned(loan_id, condition).await?;
        tracing::info!(
            "Loan {}: returned '{}' (user {})",
            loan_id,
            details.game_title,
            details.user_id
        );
        Ok(details)
    }

    /// Loans of a user; self or librarian only
    pub async fn get_user_loans(
        &self,
        claims: &UserClaims,
        user_id: i32,
        active_only: bool,
    ) -> AppResult<Vec<LoanDetails>> {
        claims.require_self_or_librarian(user_id)?;
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.get_user_loans(user_id, active_only).await
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.loans.count_active().await
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        self.repository.loans.count_overdue().await
    }
}
