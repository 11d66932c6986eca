//! Borrow and collection-access request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::request::{
        AccessRequestDetails, BorrowRequest, BorrowRequestDetails, CollectionAccessRequest,
        DecisionOutcome, SubmitBorrowRequest,
    },
};

use super::AuthenticatedUser;

/// Pending moderation queue, both kinds
#[derive(Serialize, ToSchema)]
pub struct PendingRequestsResponse {
    pub borrow_requests: Vec<BorrowRequestDetails>,
    pub access_requests: Vec<AccessRequestDetails>,
}

/// Submit a borrow request
#[utoipa::path(
    post,
    path = "/requests/borrow",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = SubmitBorrowRequest,
    responses(
        (status = 201, description = "Request filed", body = BorrowRequest),
        (status = 403, description = "Only patrons can request borrows"),
        (status = 404, description = "Game not found"),
        (status = 409, description = "A pending request already exists")
    )
)]
pub async fn submit_borrow_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SubmitBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRequest>)> {
    let filed = state
        .services
        .requests
        .submit_borrow(&claims, request.game_id)
        .await?;
    Ok((StatusCode::CREATED, Json(filed)))
}

/// Request access to a private collection
#[utoipa::path(
    post,
    path = "/collections/{id}/access-requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 201, description = "Request filed", body = CollectionAccessRequest),
        (status = 404, description = "Collection not found"),
        (status = 409, description = "A pending request already exists"),
        (status = 422, description = "Collection is public or access already granted")
    )
)]
pub async fn submit_access_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(collection_id): Path<i32>,
) -> AppResult<(StatusCode, Json<CollectionAccessRequest>)> {
    let filed = state
        .services
        .requests
        .submit_collection_access(&claims, collection_id)
        .await?;
    Ok((StatusCode::CREATED, Json(filed)))
}

/// Pending requests awaiting moderation
#[utoipa::path(
    get,
    path = "/requests/pending",
    tag = "requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending queue", body = PendingRequestsResponse),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_pending(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PendingRequestsResponse>> {
    claims.require_librarian()?;
    let (borrow_requests, access_requests) = state.services.requests.list_pending().await?;
    Ok(Json(PendingRequestsResponse {
        borrow_requests,
        access_requests,
    }))
}

/// Approve a borrow request
#[utoipa::path(
    post,
    path = "/requests/borrow/{id}/approve",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Decision applied (approval may convert to denial)", body = DecisionOutcome),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn approve_borrow_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DecisionOutcome>> {
    claims.require_librarian()?;
    let outcome = state.services.requests.approve_borrow(id).await?;
    Ok(Json(outcome))
}

/// Deny a borrow request
#[utoipa::path(
    post,
    path = "/requests/borrow/{id}/deny",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request denied", body = DecisionOutcome),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn deny_borrow_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DecisionOutcome>> {
    claims.require_librarian()?;
    let outcome = state.services.requests.deny_borrow(id).await?;
    Ok(Json(outcome))
}

/// Approve a collection access request
#[utoipa::path(
    post,
    path = "/requests/access/{id}/approve",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Access granted", body = DecisionOutcome),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn approve_access_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DecisionOutcome>> {
    claims.require_librarian()?;
    let outcome = state.services.requests.approve_access(id).await?;
    Ok(Json(outcome))
}

/// Deny a collection access request
#[utoipa::path(
    post,
    path = "/requests/access/{id}/deny",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request denied", body = DecisionOutcome),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn deny_access_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DecisionOutcome>> {
    claims.require_librarian()?;
    let outcome = state.services.requests.deny_access(id).await?;
    Ok(Json(outcome))
}
