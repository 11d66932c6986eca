//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{collections, games, health, loans, requests, reviews, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ludotheque API",
        version = "0.3.0",
        description = "Board Game Lending Library REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Ludotheque Team", email = "contact@ludotheque.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Games
        games::list_games,
        games::list_categories,
        games::get_game,
        games::create_game,
        games::update_game,
        games::delete_game,
        games::upload_game_image,
        games::list_copies,
        games::create_copy,
        games::update_copy,
        games::delete_copy,
        // Reviews
        reviews::list_reviews,
        reviews::submit_review,
        // Loans
        loans::borrow_game,
        loans::return_loan,
        loans::my_loans,
        loans::get_user_loans,
        // Collections
        collections::list_collections,
        collections::get_collection,
        collections::create_collection,
        collections::update_collection,
        collections::delete_collection,
        collections::add_game,
        collections::remove_game,
        // Requests
        requests::submit_borrow_request,
        requests::submit_access_request,
        requests::list_pending,
        requests::approve_borrow_request,
        requests::deny_borrow_request,
        requests::approve_access_request,
        requests::deny_access_request,
        // Users
        users::get_profile,
        users::update_my_profile,
        users::upload_my_picture,
        users::list_non_librarians,
        users::promote_to_librarian,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Games
            crate::models::game::BoardGame,
            crate::models::game::GameSummary,
            crate::models::game::GamePayload,
            crate::models::game::GameQuery,
            crate::models::game::Category,
            crate::models::copy::GameCopy,
            crate::models::copy::CreateCopy,
            crate::models::copy::UpdateCopy,
            crate::models::copy::CopyCondition,
            crate::models::copy::PickupLocation,
            games::GameDetailResponse,
            games::ImageUploadResponse,
            // Reviews
            crate::models::review::Review,
            crate::models::review::UpsertReview,
            // Loans
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanStatus,
            crate::models::loan::BorrowGame,
            crate::models::loan::ReturnLoan,
            loans::LoanListQuery,
            // Collections
            crate::models::collection::Collection,
            crate::models::collection::CollectionPayload,
            crate::models::collection::CollectionQuery,
            crate::models::collection::Visibility,
            collections::AddGameRequest,
            // Requests
            crate::models::request::BorrowRequest,
            crate::models::request::CollectionAccessRequest,
            crate::models::request::BorrowRequestDetails,
            crate::models::request::AccessRequestDetails,
            crate::models::request::RequestStatus,
            crate::models::request::SubmitBorrowRequest,
            crate::models::request::DecisionOutcome,
            requests::PendingRequestsResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::UpdateProfile,
            crate::models::user::RoleSet,
            crate::services::users::Profile,
            users::ProfileResponse,
            users::PictureUploadResponse,
            // Stats
            crate::services::stats::StatsResponse,
            crate::services::stats::LoanStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Catalogue management"),
        (name = "reviews", description = "Game reviews"),
        (name = "loans", description = "Loan management"),
        (name = "collections", description = "Curated collections"),
        (name = "requests", description = "Borrow and access request moderation"),
        (name = "users", description = "User profiles"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
