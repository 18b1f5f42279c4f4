//! Service Container - Centralized service access.
//!
//! Builds every service over one shared Unit of Work.

use std::sync::Arc;

use super::{AccountManager, AccountService, AuthService, Authenticator};
use crate::config::Config;
use crate::infra::{Persistence, PictureStore};

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get account service
    fn accounts(&self) -> Arc<dyn AccountService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    account_service: Arc<dyn AccountService>,
}

impl Services {
    /// Create service container from database connection, config and
    /// picture storage
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        pictures: Arc<dyn PictureStore>,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let auth_service = Arc::new(Authenticator::new(uow.clone(), config));
        let account_service = Arc::new(AccountManager::new(uow, pictures));

        Self {
            auth_service,
            account_service,
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountService> {
        self.account_service.clone()
    }
}
