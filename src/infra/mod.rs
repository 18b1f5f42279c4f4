//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections, migrations and repositories
//! - Unit of Work for transaction management
//! - Profile picture storage on the local filesystem

pub mod db;
pub mod picture_store;
pub mod repositories;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use picture_store::{FsPictureStore, PictureStore};
pub use repositories::{UserRepository, UserStore};
pub use unit_of_work::{Persistence, TransactionContext, TxFuture, TxUserRepository, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use picture_store::MockPictureStore;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockUserRepository;
