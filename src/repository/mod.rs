//! Repository layer for database operations

pub mod collections;
pub mod copies;
pub mod games;
pub mod loans;
pub mod requests;
pub mod reviews;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub games: games::GamesRepository,
    pub copies: copies::CopiesRepository,
    pub loans: loans::LoansRepository,
    pub reviews: reviews::ReviewsRepository,
    pub collections: collections::CollectionsRepository,
    pub requests: requests::RequestsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            games: games::GamesRepository::new(pool.clone()),
            copies: copies::CopiesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            collections: collections::CollectionsRepository::new(pool.clone()),
            requests: requests::RequestsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Escape a user-supplied term for inclusion in a LIKE pattern
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\'', "''").replace('%', "\\%").replace('_', "\\_")
}
