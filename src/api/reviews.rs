//! Review endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::review::{Review, UpsertReview},
};

use super::AuthenticatedUser;

/// Reviews of a game
#[utoipa::path(
    get,
    path = "/games/{id}/reviews",
    tag = "reviews",
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<Review>)
    )
)]
pub async fn list_reviews(
    State(state): State<crate::AppState>,
    Path(game_id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews.list_for_game(game_id).await?;
    Ok(Json(reviews))
}

/// Submit a review; a second submission for the same game updates the
/// caller's existing review in place
#[utoipa::path(
    post,
    path = "/games/{id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    request_body = UpsertReview,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 200, description = "Existing review updated", body = Review),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn submit_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(game_id): Path<i32>,
    Json(review): Json<UpsertReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    review
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (saved, created) = state
        .services
        .reviews
        .upsert(claims.user_id, game_id, &review)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved)))
}
