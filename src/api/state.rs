//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Database, PictureStore};
use crate::services::{AccountService, AuthService, ServiceContainer, Services};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// Account service
    pub account_service: Arc<dyn AccountService>,
    /// Database connection
    pub database: Arc<Database>,
    /// Runtime configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state from database connection, config and
    /// picture storage, wiring services through the ServiceContainer.
    pub fn from_config(
        database: Arc<Database>,
        config: Config,
        pictures: Arc<dyn PictureStore>,
    ) -> Self {
        let container = Services::from_connection(database.get_connection(), config.clone(), pictures);

        Self::new(container.auth(), container.accounts(), database, config)
    }

    /// Create new application state with manually injected services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        account_service: Arc<dyn AccountService>,
        database: Arc<Database>,
        config: Config,
    ) -> Self {
        Self {
            auth_service,
            account_service,
            database,
            config: Arc::new(config),
        }
    }
}
