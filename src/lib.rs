//! Ludotheque Board Game Lending Library
//!
//! A Rust implementation of the Ludotheque lending server, providing a REST
//! JSON API for the game catalogue, physical copies, loans, curated
//! collections, and the borrow/access request workflow.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
