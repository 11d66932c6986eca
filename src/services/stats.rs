//! Statistics service

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub games: i64,
    pub copies: i64,
    pub collections: i64,
    pub loans: LoanStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoanStats {
    /// Unreturned loans
    pub active: i64,
    /// Unreturned loans past their due date, derived from the ledger
    pub overdue: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Library-wide totals
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let pool = &self.repository.pool;

        let games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(pool)
            .await?;
        let copies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM copies")
            .fetch_one(pool)
            .await?;
        let collections: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
            .fetch_one(pool)
            .await?;

        let active = self.repository.loans.count_active().await?;
        let overdue = self.repository.loans.count_overdue().await?;

        Ok(StatsResponse {
            games,
            copies,
            collections,
            loans: LoanStats { active, overdue },
        })
    }
}
