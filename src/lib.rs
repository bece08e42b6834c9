//! Libris Library Catalog Engine
//!
//! Keeps books and members mutually consistent across add, issue, return
//! and delete operations, and exposes them over a line-delimited JSON
//! request/response protocol.

use std::sync::Arc;

pub mod api;
pub mod client;
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

impl AppState {
    /// Open the store described by the configuration and build the services
    pub async fn initialize(config: AppConfig) -> AppResult<Self> {
        let repository = repository::Repository::connect(&config.database).await?;
        let services = services::Services::new(repository, config.catalog.clone());
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}
