//! Collection endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::collection::{Collection, CollectionPayload, CollectionQuery},
};

use super::{AuthenticatedUser, OptionalUser, PaginatedResponse};

/// Add game to collection body
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddGameRequest {
    pub game_id: i32,
}

/// List collections; anonymous callers see public ones only
#[utoipa::path(
    get,
    path = "/collections",
    tag = "collections",
    params(CollectionQuery),
    responses(
        (status = 200, description = "Collections", body = PaginatedResponse<Collection>)
    )
)]
pub async fn list_collections(
    State(state): State<crate::AppState>,
    OptionalUser(claims): OptionalUser,
    Query(query): Query<CollectionQuery>,
) -> AppResult<Json<PaginatedResponse<Collection>>> {
    let (items, total) = state
        .services
        .collections
        .list(claims.as_ref(), &query)
        .await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get a collection with its games
#[utoipa::path(
    get,
    path = "/collections/{id}",
    tag = "collections",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Collection details", body = Collection),
        (status = 403, description = "Private collection, no access"),
        (status = 404, description = "Collection not found")
    )
)]
pub async fn get_collection(
    State(state): State<crate::AppState>,
    OptionalUser(claims): OptionalUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Collection>> {
    let collection = state.services.collections.get(claims.as_ref(), id).await?;
    Ok(Json(collection))
}

/// Create a collection
#[utoipa::path(
    post,
    path = "/collections",
    tag = "collections",
    security(("bearer_auth" = [])),
    request_body = CollectionPayload,
    responses(
        (status = 201, description = "Collection created", body = Collection),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_collection(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CollectionPayload>,
) -> AppResult<(StatusCode, Json<Collection>)> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let collection = state.services.collections.create(&claims, &payload).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// Update a collection
#[utoipa::path(
    put,
    path = "/collections/{id}",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    request_body = CollectionPayload,
    responses(
        (status = 200, description = "Collection updated", body = Collection),
        (status = 403, description = "Not the creator nor a librarian"),
        (status = 404, description = "Collection not found")
    )
)]
pub async fn update_collection(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<CollectionPayload>,
) -> AppResult<Json<Collection>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let collection = state
        .services
        .collections
        .update(&claims, id, &payload)
        .await?;
    Ok(Json(collection))
}

/// Delete a collection
#[utoipa::path(
    delete,
    path = "/collections/{id}",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 403, description = "Not the creator nor a librarian"),
        (status = 404, description = "Collection not found")
    )
)]
pub async fn delete_collection(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.collections.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a game to a collection
#[utoipa::path(
    post,
    path = "/collections/{id}/games",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    request_body = AddGameRequest,
    responses(
        (status = 204, description = "Game added"),
        (status = 404, description = "Collection or game not found"),
        (status = 422, description = "Placement exclusivity conflict")
    )
)]
pub async fn add_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AddGameRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .collections
        .add_game(&claims, id, request.game_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a game from a collection
#[utoipa::path(
    delete,
    path = "/collections/{id}/games/{game_id}",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Collection ID"),
        ("game_id" = i32, Path, description = "Game ID")
    ),
    responses(
        (status = 204, description = "Game removed"),
        (status = 404, description = "Membership not found")
    )
)]
pub async fn remove_game(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, game_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state
        .services
        .collections
        .remove_game(&claims, id, game_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
