//! User profile endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::LoanDetails,
        request::{AccessRequestDetails, BorrowRequestDetails},
        user::{UpdateProfile, User, UserShort},
    },
    services::users::Profile,
};

use super::{games::read_image_upload, AuthenticatedUser};

/// Profile page payload: the user plus their lending activity
#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub active_loans: Vec<LoanDetails>,
    pub previous_loans: Vec<LoanDetails>,
    pub borrow_requests: Vec<BorrowRequestDetails>,
    pub collection_requests: Vec<AccessRequestDetails>,
}

/// Picture upload response
#[derive(Serialize, ToSchema)]
pub struct PictureUploadResponse {
    pub avatar_url: String,
}

/// Get a user's profile with loans and requests
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 403, description = "Not the user nor a librarian"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<ProfileResponse>> {
    claims.require_self_or_librarian(user_id)?;

    let profile = state.services.users.get_profile(user_id).await?;
    let all_loans = state
        .services
        .loans
        .get_user_loans(&claims, user_id, false)
        .await?;
    let (active_loans, previous_loans): (Vec<_>, Vec<_>) =
        all_loans.into_iter().partition(|l| !l.returned);
    let (borrow_requests, collection_requests) =
        state.services.requests.list_for_user(user_id).await?;

    Ok(Json(ProfileResponse {
        profile,
        active_loans,
        previous_loans,
        borrow_requests,
        collection_requests,
    }))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_my_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(update): Json<UpdateProfile>,
) -> AppResult<Json<Profile>> {
    update
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = state.services.users.update_profile(&claims, &update).await?;
    Ok(Json(profile))
}

/// Upload the caller's profile picture
#[utoipa::path(
    post,
    path = "/users/me/picture",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Picture stored", body = PictureUploadResponse),
        (status = 400, description = "Missing, oversized, or non-image file")
    )
)]
pub async fn upload_my_picture(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<Json<PictureUploadResponse>> {
    let (filename, bytes) =
        read_image_upload(multipart, state.services.media.max_upload_bytes()).await?;
    let avatar_url = state
        .services
        .users
        .set_profile_picture(&claims, &filename, &bytes)
        .await?;

    Ok(Json(PictureUploadResponse { avatar_url }))
}

/// Users eligible for promotion to librarian
#[utoipa::path(
    get,
    path = "/users/non-librarians",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users without the librarian role", body = Vec<UserShort>),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_non_librarians(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserShort>>> {
    claims.require_librarian()?;
    let users = state.services.users.list_non_librarians().await?;
    Ok(Json(users))
}

/// Promote a user to librarian
#[utoipa::path(
    post,
    path = "/users/{id}/promote",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User promoted", body = User),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn promote_to_librarian(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_librarian()?;
    let user = state.services.users.promote_to_librarian(user_id).await?;
    Ok(Json(user))
}
