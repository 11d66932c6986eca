//! Business logic services

pub mod catalog;
pub mod collections;
pub mod loans;
pub mod media;
pub mod requests;
pub mod reviews;
pub mod stats;
pub mod users;

use crate::{
    config::{LoanConfig, MediaConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub collections: collections::CollectionsService,
    pub requests: requests::RequestsService,
    pub reviews: reviews::ReviewsService,
    pub users: users::UsersService,
    pub media: media::MediaService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, media_config: MediaConfig, loan_config: LoanConfig) -> Self {
        let media = media::MediaService::new(media_config);
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), media.clone()),
            loans: loans::LoansService::new(repository.clone(), loan_config.clone()),
            collections: collections::CollectionsService::new(repository.clone()),
            requests: requests::RequestsService::new(repository.clone(), loan_config),
            reviews: reviews::ReviewsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), media.clone()),
            stats: stats::StatsService::new(repository),
            media,
        }
    }
}
