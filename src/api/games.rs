//! Catalogue (board game) endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::{CreateCopy, GameCopy, UpdateCopy},
        game::{BoardGame, Category, GamePayload, GameQuery, GameSummary},
        review::Review,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Game detail with the caller's review context
#[derive(Serialize, ToSchema)]
pub struct GameDetailResponse {
    pub game: BoardGame,
    /// The caller's existing review, if they wrote one
    pub own_review: Option<Review>,
    /// Whether the caller has ever borrowed this game
    pub has_borrowed: bool,
}

/// Image upload response
#[derive(Serialize, ToSchema)]
pub struct ImageUploadResponse {
    pub image_url: String,
}

/// Browse and search the catalogue
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    params(GameQuery),
    responses(
        (status = 200, description = "Matching games", body = PaginatedResponse<GameSummary>)
    )
)]
pub async fn list_games(
    State(state): State<crate::AppState>,
    Query(query): Query<GameQuery>,
) -> AppResult<Json<PaginatedResponse<GameSummary>>> {
    let (items, total) = state.services.catalog.search_games(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// List all categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "games",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// Get game details with the caller's review context
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    responses(
        (status = 200, description = "Game details", body = GameDetailResponse),
        (status = 404, description = "Game not found")
    )
)]
pub async fn get_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<GameDetailResponse>> {
    let game = state.services.catalog.get_game(id).await?;
    let (own_review, has_borrowed) = state
        .services
        .reviews
        .own_review_context(claims.user_id, id)
        .await?;

    Ok(Json(GameDetailResponse {
        game,
        own_review,
        has_borrowed,
    }))
}

/// Create a new game
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    security(("bearer_auth" = [])),
    request_body = GamePayload,
    responses(
        (status = 201, description = "Game created", body = BoardGame),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn create_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<GamePayload>,
) -> AppResult<(StatusCode, Json<BoardGame>)> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let game = state.services.catalog.create_game(&payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Update an existing game
#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    request_body = GamePayload,
    responses(
        (status = 200, description = "Game updated", body = BoardGame),
        (status = 404, description = "Game not found")
    )
)]
pub async fn update_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<GamePayload>,
) -> AppResult<Json<BoardGame>> {
    claims.require_librarian()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let game = state.services.catalog.update_game(id, &payload).await?;
    Ok(Json(game))
}

/// Delete a game
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn delete_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_librarian()?;
    state.services.catalog.delete_game(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload the catalogue image for a game
#[utoipa::path(
    post,
    path = "/games/{id}/image",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    responses(
        (status = 200, description = "Image stored", body = ImageUploadResponse),
        (status = 400, description = "Missing, oversized, or non-image file"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn upload_game_image(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<Json<ImageUploadResponse>> {
    claims.require_librarian()?;

    let (filename, bytes) =
        read_image_upload(multipart, state.services.media.max_upload_bytes()).await?;
    let image_url = state
        .services
        .catalog
        .attach_game_image(id, &filename, &bytes)
        .await?;

    Ok(Json(ImageUploadResponse { image_url }))
}

/// Pull the first image file out of a multipart body, enforcing the size cap
/// and content type before anything is stored.
pub(super) async fn read_image_upload(
    mut multipart: Multipart,
    max_bytes: usize,
) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };

        let is_image = field
            .content_type()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(AppError::Validation(
                "Upload a JPG, PNG, or GIF image".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "The file you uploaded is too large. Maximum size allowed is {}MB.",
                max_bytes / (1024 * 1024)
            )));
        }

        return Ok((filename, bytes.to_vec()));
    }

    Err(AppError::BadRequest("No image file in request".to_string()))
}

/// List the copies of a game
#[utoipa::path(
    get,
    path = "/games/{id}/copies",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    responses(
        (status = 200, description = "Copies of the game", body = Vec<GameCopy>)
    )
)]
pub async fn list_copies(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<GameCopy>>> {
    let copies = state.services.catalog.list_copies(id).await?;
    Ok(Json(copies))
}

/// Add a copy to a game
#[utoipa::path(
    post,
    path = "/games/{id}/copies",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Game ID")
    ),
    request_body = CreateCopy,
    responses(
        (status = 201, description = "Copy created", body = GameCopy),
        (status = 404, description = "Game not found")
    )
)]
pub async fn create_copy(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(create): Json<CreateCopy>,
) -> AppResult<(StatusCode, Json<GameCopy>)> {
    claims.require_librarian()?;
    let copy = state.services.catalog.create_copy(id, &create).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Update a copy
#[utoipa::path(
    put,
    path = "/copies/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    request_body = UpdateCopy,
    responses(
        (status = 200, description = "Copy updated", body = GameCopy),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn update_copy(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateCopy>,
) -> AppResult<Json<GameCopy>> {
    claims.require_librarian()?;
    let copy = state.services.catalog.update_copy(id, &update).await?;
    Ok(Json(copy))
}

/// Remove a copy
#[utoipa::path(
    delete,
    path = "/copies/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Copy ID")
    ),
    responses(
        (status = 204, description = "Copy removed"),
        (status = 404, description = "Copy not found"),
        (status = 422, description = "Copy is on loan")
    )
)]
pub async fn delete_copy(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_librarian()?;
    state.services.catalog.delete_copy(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
