//! Ludotheque Server - Board Game Lending Library

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ludotheque_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("ludotheque_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ludotheque Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.media.clone(), config.loans.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Catalogue
        .route("/games", get(api::games::list_games))
        .route("/games", post(api::games::create_game))
        .route("/games/:id", get(api::games::get_game))
        .route("/games/:id", put(api::games::update_game))
        .route("/games/:id", delete(api::games::delete_game))
        .route("/games/:id/image", post(api::games::upload_game_image))
        .route("/games/:id/copies", get(api::games::list_copies))
        .route("/games/:id/copies", post(api::games::create_copy))
        .route("/copies/:id", put(api::games::update_copy))
        .route("/copies/:id", delete(api::games::delete_copy))
        .route("/categories", get(api::games::list_categories))
        // Reviews
        .route("/games/:id/reviews", get(api::reviews::list_reviews))
        .route("/games/:id/reviews", post(api::reviews::submit_review))
        // Loans
        .route("/loans", post(api::loans::borrow_game))
        .route("/loans/:id/return", post(api::loans::return_loan))
        .route("/loans/me", get(api::loans::my_loans))
        .route("/users/:id/loans", get(api::loans::get_user_loans))
        // Collections
        .route("/collections", get(api::collections::list_collections))
        .route("/collections", post(api::collections::create_collection))
        .route("/collections/:id", get(api::collections::get_collection))
        .route("/collections/:id", put(api::collections::update_collection))
        .route("/collections/:id", delete(api::collections::delete_collection))
        .route("/collections/:id/games", post(api::collections::add_game))
        .route(
            "/collections/:id/games/:game_id",
            delete(api::collections::remove_game),
        )
        .route(
            "/collections/:id/access-requests",
            post(api::requests::submit_access_request),
        )
        // Requests
        .route("/requests/borrow", post(api::requests::submit_borrow_request))
        .route("/requests/pending", get(api::requests::list_pending))
        .route(
            "/requests/borrow/:id/approve",
            post(api::requests::approve_borrow_request),
        )
        .route(
            "/requests/borrow/:id/deny",
            post(api::requests::deny_borrow_request),
        )
        .route(
            "/requests/access/:id/approve",
            post(api::requests::approve_access_request),
        )
        .route(
            "/requests/access/:id/deny",
            post(api::requests::deny_access_request),
        )
        // Users
        .route("/users/me", put(api::users::update_my_profile))
        .route("/users/me/picture", post(api::users::upload_my_picture))
        .route("/users/non-librarians", get(api::users::list_non_librarians))
        .route("/users/:id", get(api::users::get_profile))
        .route("/users/:id/promote", post(api::users::promote_to_librarian))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
