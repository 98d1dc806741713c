use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{UpdateUser, User};
use crate::query::UserQuery;

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user; `DuplicateEmail` if the email is taken
    async fn create(&self, user: User) -> UserResult<User>;

    /// Get a user by ID
    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Get a user by exact (case-sensitive) email
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// One page of matching users plus the total number of matches
    async fn search(&self, query: &UserQuery) -> UserResult<(Vec<User>, u64)>;

    /// Merge `input` into the stored user; `None` if it does not exist
    async fn update(&self, id: Uuid, input: UpdateUser) -> UserResult<Option<User>>;

    /// Delete a user by ID, returning whether a row was removed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail);
        }

        users.push(user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn search(&self, query: &UserQuery) -> UserResult<(Vec<User>, u64)> {
        let users = self.users.read().await;

        let mut matched: Vec<&User> = users.iter().filter(|u| query.matches(u)).collect();
        let total = matched.len() as u64;

        // Newest first, ties by id (UUIDv7 follows insertion order)
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let page = matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;

        if let Some(email) = &input.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(UserError::DuplicateEmail);
            }
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        user.apply_update(input);

        tracing::info!(user_id = %id, "Updated user");
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;

        let before = users.len();
        users.retain(|u| u.id != id);

        if users.len() < before {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUser;

    fn new_user(name: &str, email: &str) -> User {
        User::new(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo.create(new_user("Ann", "ann@x.com")).await.unwrap();

        let fetched = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));

        let by_email = repo.find_by_email("ann@x.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_email_is_case_sensitive() {
        let repo = InMemoryUserRepository::new();

        repo.create(new_user("Ann", "Ann@x.com")).await.unwrap();
        repo.create(new_user("ann", "ann@x.com")).await.unwrap();

        assert!(repo.find_by_email("ANN@X.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();

        repo.create(new_user("One", "dup@x.com")).await.unwrap();
        let result = repo.create(new_user("Two", "dup@x.com")).await;

        assert!(matches!(result, Err(UserError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_search_paginates_and_counts_all_matches() {
        let repo = InMemoryUserRepository::new();
        for i in 0..5 {
            repo.create(new_user(&format!("User {i}"), &format!("u{i}@x.com")))
                .await
                .unwrap();
        }

        let query = UserQuery {
            limit: 2,
            offset: 1,
            ..Default::default()
        };
        let (page, total) = repo.search(&query).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_search_orders_newest_first() {
        let repo = InMemoryUserRepository::new();
        let mut older = new_user("Old", "old@x.com");
        older.created_at -= chrono::Duration::seconds(10);
        older.updated_at = older.created_at;
        repo.create(older).await.unwrap();
        repo.create(new_user("New", "new@x.com")).await.unwrap();

        let (page, _) = repo.search(&UserQuery::default()).await.unwrap();

        let names: Vec<_> = page.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email_and_missing_id() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("Ann", "ann@x.com")).await.unwrap();
        let bob = repo.create(new_user("Bob", "bob@x.com")).await.unwrap();

        let taken = UpdateUser {
            email: Some("ann@x.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(bob.id, taken).await,
            Err(UserError::DuplicateEmail)
        ));

        let missing = repo
            .update(Uuid::now_v7(), UpdateUser::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_keeping_own_email_is_allowed() {
        let repo = InMemoryUserRepository::new();
        let ann = repo.create(new_user("Ann", "ann@x.com")).await.unwrap();

        let updated = repo
            .update(
                ann.id,
                UpdateUser {
                    email: Some("ann@x.com".to_string()),
                    status: Some("inactive".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, "inactive");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = InMemoryUserRepository::new();
        let ann = repo.create(new_user("Ann", "ann@x.com")).await.unwrap();

        assert!(repo.delete(ann.id).await.unwrap());
        assert!(!repo.delete(ann.id).await.unwrap());
        assert!(repo.find_by_id(ann.id).await.unwrap().is_none());
    }
}
