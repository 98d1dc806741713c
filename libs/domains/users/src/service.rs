use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, ListMeta, UpdateUser, User, UserList};
use crate::query::{UserListParams, UserQuery};
use crate::repository::UserRepository;

/// Service layer for User business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a user after validating input and checking the email is free.
    ///
    /// The pre-check is best effort; the storage unique constraint decides
    /// concurrent creates with the same email.
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input.validate()?;

        if self.repository.find_by_email(&input.email).await?.is_some() {
            return Err(UserError::DuplicateEmail);
        }

        self.repository.create(User::new(input)).await
    }

    /// Search users; never fails on bad parameters.
    pub async fn list_users(&self, params: &UserListParams) -> UserResult<UserList> {
        let query = UserQuery::from_params(params);
        let (data, total) = self.repository.search(&query).await?;

        Ok(UserList {
            data,
            meta: ListMeta {
                total,
                limit: query.limit,
                offset: query.offset,
            },
        })
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Merge the supplied fields into an existing user.
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<User> {
        let current = self.get_user(id).await?;

        input.validate()?;

        if let Some(email) = input.email.as_deref().filter(|e| *e != current.email) {
            if self.repository.find_by_email(email).await?.is_some() {
                return Err(UserError::DuplicateEmail);
            }
        }

        self.repository
            .update(id, input)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use mockall::predicate::eq;

    fn ann() -> User {
        User::new(CreateUser {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_create_user_checks_email_first() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq("ann@x.com"))
            .returning(|_| Ok(Some(ann())));
        repo.expect_create().never();

        let service = UserService::new(repo);
        let result = service
            .create_user(CreateUser {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_create_user_validates_before_touching_storage() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().never();
        repo.expect_create().never();

        let service = UserService::new(repo);
        let result = service.create_user(CreateUser::default()).await;

        assert!(matches!(result, Err(UserError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_user_persists_new_record() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create().times(1).returning(Ok);

        let service = UserService::new(repo);
        let user = service
            .create_user(CreateUser {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(user.status, "active");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn test_list_users_reports_normalized_meta() {
        let mut repo = MockUserRepository::new();
        repo.expect_search()
            .withf(|q| q.limit == 100 && q.offset == 0)
            .returning(|_| Ok((vec![ann()], 7)));

        let service = UserService::new(repo);
        let params = UserListParams {
            limit: Some("1000".to_string()),
            offset: Some("-5".to_string()),
            ..Default::default()
        };
        let list = service.list_users(&params).await.unwrap();

        assert_eq!(list.data.len(), 1);
        assert_eq!(
            list.meta,
            ListMeta {
                total: 7,
                limit: 100,
                offset: 0
            }
        );
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserService::new(repo);
        let result = service.get_user(Uuid::now_v7()).await;

        assert!(matches!(result, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_user_rejects_email_owned_by_someone_else() {
        let current = ann();
        let id = current.id;

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        repo.expect_find_by_email()
            .with(eq("bob@x.com"))
            .returning(|_| {
                Ok(Some(User::new(CreateUser {
                    name: "Bob".to_string(),
                    email: "bob@x.com".to_string(),
                    ..Default::default()
                })))
            });
        repo.expect_update().never();

        let service = UserService::new(repo);
        let result = service
            .update_user(
                id,
                UpdateUser {
                    email: Some("bob@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_update_user_same_email_skips_uniqueness_check() {
        let current = ann();
        let id = current.id;
        let stored = current.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        repo.expect_find_by_email().never();
        repo.expect_update().returning(move |_, input| {
            let mut user = stored.clone();
            user.apply_update(input);
            Ok(Some(user))
        });

        let service = UserService::new(repo);
        let updated = service
            .update_user(
                id,
                UpdateUser {
                    email: Some("ann@x.com".to_string()),
                    name: Some("Annie".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Annie");
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found_before_validation() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserService::new(repo);
        let result = service
            .update_user(
                Uuid::now_v7(),
                UpdateUser {
                    name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete().returning(|_| Ok(false));

        let service = UserService::new(repo);
        let result = service.delete_user(Uuid::now_v7()).await;

        assert!(matches!(result, Err(UserError::NotFound)));
    }
}
