//! Account service - viewing, listing and editing user accounts.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ACCOUNTS_PER_PAGE;
use crate::domain::{AccountUpdate, Availability, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{PictureStore, UnitOfWork};
use crate::types::Paginated;
use crate::with_transaction;

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Get account by ID
    async fn get_account(&self, id: i32) -> AppResult<User>;

    /// Get account by ID, `None` when it does not exist
    async fn find_account(&self, id: i32) -> AppResult<Option<User>>;

    /// One page of accounts, newest first. Pages below 1 or past the last
    /// page are `NotFound`, except page 1 of an empty listing.
    async fn list_accounts(&self, page: i64) -> AppResult<Paginated<User>>;

    /// Apply an update to `account_id` on behalf of `acting_user_id`.
    ///
    /// Only the owner may update an account. The picture, if any, is stored
    /// before the row is written and removed again if the write fails; the
    /// previous file is left in place.
    async fn update_account(
        &self,
        acting_user_id: i32,
        account_id: i32,
        update: AccountUpdate,
    ) -> AppResult<User>;
}

/// Concrete implementation of AccountService using Unit of Work.
pub struct AccountManager<U: UnitOfWork> {
    uow: Arc<U>,
    pictures: Arc<dyn PictureStore>,
}

impl<U: UnitOfWork> AccountManager<U> {
    pub fn new(uow: Arc<U>, pictures: Arc<dyn PictureStore>) -> Self {
        Self { uow, pictures }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> AccountService for AccountManager<U> {
    async fn get_account(&self, id: i32) -> AppResult<User> {
        self.find_account(id).await?.ok_or_not_found()
    }

    async fn find_account(&self, id: i32) -> AppResult<Option<User>> {
        self.uow.users().find_by_id(id).await
    }

    async fn list_accounts(&self, page: i64) -> AppResult<Paginated<User>> {
        let page = u64::try_from(page)
            .ok()
            .filter(|page| *page >= 1)
            .ok_or(AppError::NotFound)?;

        let (accounts, total) = self.uow.users().list_page(page, ACCOUNTS_PER_PAGE).await?;
        if accounts.is_empty() && page != 1 {
            return Err(AppError::NotFound);
        }

        Ok(Paginated::new(accounts, page, ACCOUNTS_PER_PAGE, total))
    }

    async fn update_account(
        &self,
        acting_user_id: i32,
        account_id: i32,
        update: AccountUpdate,
    ) -> AppResult<User> {
        let target = self.get_account(account_id).await?;
        if target.id != acting_user_id {
            tracing::warn!(acting_user_id, account_id, "Rejected update of another user's account");
            return Err(AppError::Forbidden);
        }

        let AccountUpdate {
            username,
            email,
            picture,
        } = update;

        // Checked before the picture is written so that a rejected form
        // leaves no orphaned file behind.
        if let Availability::Taken(fields) = self
            .uow
            .users()
            .check_availability(&username, &email, Some(target.id))
            .await?
        {
            return Err(AppError::Taken(fields));
        }

        let image_file = match picture {
            Some(upload) => Some(self.pictures.save(upload).await?),
            None => None,
        };

        let stored = image_file.clone();
        let user_id = target.id;
        let result: AppResult<User> = with_transaction!(self.uow, |ctx| {
            let users = ctx.users();
            if let Availability::Taken(fields) =
                users.check_availability(&username, &email, Some(user_id)).await?
            {
                return Err(AppError::Taken(fields));
            }
            users.update_account(user_id, username, email, image_file).await
        });

        let user = match result {
            Ok(user) => user,
            Err(e) => {
                if let Some(file_name) = stored {
                    if let Err(remove_err) = self.pictures.remove(&file_name).await {
                        tracing::warn!(file = %file_name, error = %remove_err, "Could not remove unused picture");
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(
            user_id = user.id,
            username = %user.username,
            image_file = %user.image_file,
            "Updated account"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::domain::{PictureUpload, UniqueField};
    use crate::infra::{
        MockPictureStore, MockUserRepository, TransactionContext, TxFuture, UserRepository,
    };

    /// UnitOfWork over a mocked repository; transactions are not available.
    struct TestUnitOfWork {
        user_repo: Arc<MockUserRepository>,
    }

    #[async_trait]
    impl UnitOfWork for TestUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.user_repo.clone()
        }

        async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
            T: Send,
        {
            Err(AppError::internal("Transactions not supported in test mock"))
        }
    }

    fn service(
        repo: MockUserRepository,
        pictures: MockPictureStore,
    ) -> AccountManager<TestUnitOfWork> {
        let uow = TestUnitOfWork {
            user_repo: Arc::new(repo),
        };
        AccountManager::new(Arc::new(uow), Arc::new(pictures))
    }

    fn user(id: i32) -> User {
        User::new(
            id,
            format!("user{}", id),
            format!("user{}@example.com", id),
            "hash".into(),
        )
    }

    fn update(picture: Option<PictureUpload>) -> AccountUpdate {
        AccountUpdate {
            username: "renamed".into(),
            email: "renamed@example.com".into(),
            picture,
        }
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = service(repo, MockPictureStore::new()).get_account(99).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_accounts_rejects_page_zero() {
        let mut repo = MockUserRepository::new();
        repo.expect_list_page().never();

        let result = service(repo, MockPictureStore::new()).list_accounts(0).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_accounts_past_last_page() {
        let mut repo = MockUserRepository::new();
        repo.expect_list_page()
            .with(eq(5), eq(ACCOUNTS_PER_PAGE))
            .returning(|_, _| Ok((vec![], 4)));

        let result = service(repo, MockPictureStore::new()).list_accounts(5).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_accounts_empty_first_page() {
        let mut repo = MockUserRepository::new();
        repo.expect_list_page().returning(|_, _| Ok((vec![], 0)));

        let page = service(repo, MockPictureStore::new())
            .list_accounts(1)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_list_accounts_builds_page() {
        let mut repo = MockUserRepository::new();
        repo.expect_list_page()
            .with(eq(2), eq(ACCOUNTS_PER_PAGE))
            .returning(|_, _| Ok((vec![user(4), user(3), user(2)], 7)));

        let page = service(repo, MockPictureStore::new())
            .list_accounts(2)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev() && page.has_next());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(2))
            .returning(|id| Ok(Some(user(id))));
        repo.expect_check_availability().never();
        let mut pictures = MockPictureStore::new();
        pictures.expect_save().never();

        let result = service(repo, pictures).update_account(1, 2, update(None)).await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_update_missing_target_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = service(repo, MockPictureStore::new())
            .update_account(1, 7, update(None))
            .await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_with_taken_username_stores_no_picture() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        repo.expect_check_availability()
            .with(eq("renamed"), eq("renamed@example.com"), eq(Some(1)))
            .returning(|_, _, _| Ok(Availability::Taken(vec![UniqueField::Username])));
        let mut pictures = MockPictureStore::new();
        pictures.expect_save().never();

        let picture = PictureUpload::new("me.png", vec![1, 2, 3]);
        let result = service(repo, pictures)
            .update_account(1, 1, update(Some(picture)))
            .await;

        assert!(matches!(result, Err(AppError::Taken(fields)) if fields == vec![UniqueField::Username]));
    }

    #[tokio::test]
    async fn test_picture_rejection_stops_update() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        repo.expect_check_availability()
            .returning(|_, _, _| Ok(Availability::Available));
        let mut pictures = MockPictureStore::new();
        pictures
            .expect_save()
            .with(always())
            .times(1)
            .returning(|_| Err(AppError::validation("Uploaded file is not a valid image")));

        let picture = PictureUpload::new("me.png", b"garbage".to_vec());
        let result = service(repo, pictures)
            .update_account(1, 1, update(Some(picture)))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_write_removes_new_picture() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        repo.expect_check_availability()
            .returning(|_, _, _| Ok(Availability::Available));
        let mut pictures = MockPictureStore::new();
        pictures
            .expect_save()
            .times(1)
            .returning(|_| Ok("0123456789abcdef.png".into()));
        pictures
            .expect_remove()
            .with(eq("0123456789abcdef.png"))
            .times(1)
            .returning(|_| Ok(()));

        // The test unit of work fails every transaction.
        let picture = PictureUpload::new("me.png", vec![1, 2, 3]);
        let result = service(repo, pictures)
            .update_account(1, 1, update(Some(picture)))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_failed_write_without_picture_removes_nothing() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(user(id))));
        repo.expect_check_availability()
            .returning(|_, _, _| Ok(Availability::Available));
        let mut pictures = MockPictureStore::new();
        pictures.expect_remove().never();

        let result = service(repo, pictures).update_account(1, 1, update(None)).await;

        assert!(result.is_err());
    }
}
