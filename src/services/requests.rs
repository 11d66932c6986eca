//! Borrow and collection-access request workflow service

use crate::{
    config::LoanConfig,
    error::{AppError, AppResult},
    models::{
        request::{
            AccessRequestDetails, BorrowRequest, BorrowRequestDetails, CollectionAccessRequest,
            DecisionOutcome,
        },
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
    loan_config: LoanConfig,
}

impl RequestsService {
    pub fn new(repository: Repository, loan_config: LoanConfig) -> Self {
        Self {
            repository,
            loan_config,
        }
    }

    /// File a borrow request. The requester must hold the patron capability.
    pub async fn submit_borrow(
        &self,
        claims: &UserClaims,
        game_id: i32,
    ) -> AppResult<BorrowRequest> {
        claims.require_patron()?;
        let request = self
            .repository
            .requests
            .create_borrow(claims.user_id, game_id)
            .await?;
        tracing::info!(
            "Borrow request {}: user {} -> game {}",
            request.id,
            claims.user_id,
            game_id
        );
        Ok(request)
    }

    /// File an access request for a private collection
    pub async fn submit_collection_access(
        &self,
        claims: &UserClaims,
        collection_id: i32,
    ) -> AppResult<CollectionAccessRequest> {
        let collection = self.repository.collections.get_by_id(collection_id).await?;

        if !collection.is_private() {
            return Err(AppError::BusinessRule(
                "This collection is already public".to_string(),
            ));
        }

        let already_authorized = self
            .repository
            .collections
            .is_user_authorized(collection_id, claims.user_id)
            .await?;
        if collection.creator_id == claims.user_id || already_authorized {
            return Err(AppError::BusinessRule(
                "You already have access to this collection".to_string(),
            ));
        }

        let request = self
            .repository
            .requests
            .create_access(claims.user_id, collection_id)
            .await?;
        tracing::info!(
            "Access request {}: user {} -> collection '{}'",
            request.id,
            claims.user_id,
            collection.title
        );
        Ok(request)
    }

    /// Pending requests of both kinds, for the moderation screen
    pub async fn list_pending(
        &self,
    ) -> AppResult<(Vec<BorrowRequestDetails>, Vec<AccessRequestDetails>)> {
        let borrow = self.repository.requests.list_pending_borrow().await?;
        let access = self.repository.requests.list_pending_access().await?;
        Ok((borrow, access))
    }

    /// A user's own requests of both kinds, for the profile screen
    pub async fn list_for_user(
        &self,
        user_id: i32,
    ) -> AppResult<(Vec<BorrowRequestDetails>, Vec<AccessRequestDetails>)> {
        let borrow = self.repository.requests.list_user_borrow(user_id).await?;
        let access = self.repository.requests.list_user_access(user_id).await?;
        Ok((borrow, access))
    }

    /// Approve a borrow request; capacity violations at approval time turn
    /// the decision into a denial with the reason attached.
    pub async fn approve_borrow(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        let outcome = self
            .repository
            .requests
            .approve_borrow(
                request_id,
                self.loan_config.period_days,
                self.loan_config.max_active,
            )
            .await?;
        match &outcome.reason {
            Some(reason) => tracing::info!(
                "Borrow request {}: denied on approval ({})",
                request_id,
                reason
            ),
            None => tracing::info!(
                "Borrow request {}: approved, loan {:?}",
                request_id,
                outcome.loan_id
            ),
        }
        Ok(outcome)
    }

    /// Deny a borrow request
    pub async fn deny_borrow(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        self.repository.requests.deny_borrow(request_id).await
    }

    /// Approve a collection access request
    pub async fn approve_access(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        self.repository.requests.approve_access(request_id).await
    }

    /// Deny a collection access request
    pub async fn deny_access(&self, request_id: i32) -> AppResult<DecisionOutcome> {
        self.repository.requests.deny_access(request_id).await
    }
}
