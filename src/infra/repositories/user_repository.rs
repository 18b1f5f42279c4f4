//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::entities::user::{self, Entity as UserEntity};
use crate::domain::{Availability, User};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read access to users for dependency injection.
///
/// Writes go through `TxUserRepository` so that they always run inside
/// a transaction together with their uniqueness check.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Check a username/email pair against existing users, ignoring `exclude`
    async fn check_availability(
        &self,
        username: &str,
        email: &str,
        exclude: Option<i32>,
    ) -> AppResult<Availability>;

    /// One page of users ordered by descending id, plus the total user count.
    /// `page` is 1-indexed; page 0 and pages past the last one come back empty.
    async fn list_page(&self, page: u64, per_page: u64) -> AppResult<(Vec<User>, u64)>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        find_one(&self.db, user::Column::Email.eq(email)).await
    }

    async fn check_availability(
        &self,
        username: &str,
        email: &str,
        exclude: Option<i32>,
    ) -> AppResult<Availability> {
        availability(&self.db, username, email, exclude).await
    }

    async fn list_page(&self, page: u64, per_page: u64) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        // Pages past the end never reach the offset computation.
        if page == 0 || page > total.div_ceil(per_page.max(1)).max(1) {
            return Ok((Vec::new(), total));
        }
        let models = paginator.fetch_page(page - 1).await?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }
}

/// Fetch the single user matching `condition`.
async fn find_one<C, F>(db: &C, condition: F) -> AppResult<Option<User>>
where
    C: ConnectionTrait,
    F: sea_orm::sea_query::IntoCondition,
{
    let result = UserEntity::find()
        .filter(condition)
        .one(db)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(User::from))
}

/// Id of the user holding `value` in `column`, if any.
async fn owner_of<C: ConnectionTrait>(
    db: &C,
    column: user::Column,
    value: &str,
) -> AppResult<Option<i32>> {
    let id = UserEntity::find()
        .select_only()
        .column(user::Column::Id)
        .filter(column.eq(value))
        .into_tuple::<i32>()
        .one(db)
        .await?;

    Ok(id)
}

/// Uniqueness check shared by the plain and the transactional repository.
pub(crate) async fn availability<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
    exclude: Option<i32>,
) -> AppResult<Availability> {
    let username_owner = owner_of(db, user::Column::Username, username).await?;
    let email_owner = owner_of(db, user::Column::Email, email).await?;

    Ok(Availability::from_matches(username_owner, email_owner, exclude))
}
