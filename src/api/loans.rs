//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::loan::{BorrowGame, LoanDetails, ReturnLoan},
};

use super::AuthenticatedUser;

/// Loan listing filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanListQuery {
    /// Restrict to unreturned loans
    pub active: Option<bool>,
}

/// Borrow a game
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BorrowGame,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 403, description = "Only patrons can borrow"),
        (status = 404, description = "Game not found"),
        (status = 422, description = "No copies available or loan cap reached")
    )
)]
pub async fn borrow_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowGame>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let loan = state
        .services
        .loans
        .borrow_game(&claims, request.game_id)
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed game
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned", body = LoanDetails),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
    request: Option<Json<ReturnLoan>>,
) -> AppResult<Json<LoanDetails>> {
    let condition = request.and_then(|Json(r)| r.condition);
    let loan = state
        .services
        .loans
        .return_loan(&claims, loan_id, condition)
        .await?;
    Ok(Json(loan))
}

/// The caller's own loans
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanListQuery),
    responses(
        (status = 200, description = "Caller's loans", body = Vec<LoanDetails>)
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanListQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .get_user_loans(&claims, claims.user_id, query.active.unwrap_or(false))
        .await?;
    Ok(Json(loans))
}

/// Loans of a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        LoanListQuery
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanDetails>),
        (status = 403, description = "Not the user nor a librarian"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Query(query): Query<LoanListQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .get_user_loans(&claims, user_id, query.active.unwrap_or(false))
        .await?;
    Ok(Json(loans))
}
