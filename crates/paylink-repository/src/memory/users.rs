//! In-memory user store.

use crate::entities::{NewUser, User, UserChanges};
use crate::traits::UserRepository;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use paylink_core::{PaylinkError, PaylinkResult, UserId};

/// User store with a unique email index.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn email_key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn duplicate_email(email: &str) -> PaylinkError {
        PaylinkError::conflict(format!("User with email {} already exists", email))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> PaylinkResult<User> {
        let user = user.into_user();

        match self.emails.entry(Self::email_key(&user.email)) {
            Entry::Occupied(_) => Err(Self::duplicate_email(&user.email)),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }

    async fn find_all(&self) -> PaylinkResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn find_by_id(&self, id: UserId) -> PaylinkResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> PaylinkResult<Option<User>> {
        let Some(id) = self.emails.get(&Self::email_key(email)).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> PaylinkResult<Option<User>> {
        // Never hold a user shard while touching the email index; `create`
        // locks in the opposite order.
        let Some(current_email) = self.users.get(&id).map(|u| u.email.clone()) else {
            return Ok(None);
        };

        let mut claimed_key = None;
        if let Some(new_email) = &changes.email {
            let old_key = Self::email_key(&current_email);
            let new_key = Self::email_key(new_email);
            if new_key != old_key {
                match self.emails.entry(new_key.clone()) {
                    Entry::Occupied(_) => return Err(Self::duplicate_email(new_email)),
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
                self.emails.remove(&old_key);
                claimed_key = Some(new_key);
            }
        }

        let Some(mut user) = self.users.get_mut(&id) else {
            if let Some(key) = claimed_key {
                self.emails.remove(&key);
            }
            return Ok(None);
        };
        changes.apply_to(&mut user);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: UserId) -> PaylinkResult<bool> {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.emails.remove(&Self::email_key(&user.email));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("test@example.com")).await.unwrap();

        let found = repo.find_by_id(user.id).await.unwrap();
        assert_eq!(found.unwrap().email, "test@example.com");
        assert!(repo.find_by_id(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("test@example.com")).await.unwrap();

        let err = repo.create(new_user("TEST@example.com")).await.unwrap_err();
        assert!(matches!(err, PaylinkError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_by_email_case_insensitive() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("test@example.com")).await.unwrap();

        assert!(repo.find_by_email("TEST@EXAMPLE.COM").await.unwrap().is_some());
        assert!(repo.find_by_email("other@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_moves_email_index() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("old@example.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("new@example.com".to_string()),
            ..UserChanges::default()
        };
        let updated = repo.update(user.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert!(repo.find_by_email("old@example.com").await.unwrap().is_none());
        assert!(repo.create(new_user("old@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_to_taken_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.unwrap();
        let b = repo.create(new_user("b@example.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("a@example.com".to_string()),
            ..UserChanges::default()
        };
        assert!(repo.update(b.id, changes).await.is_err());
        assert_eq!(
            repo.find_by_id(b.id).await.unwrap().unwrap().email,
            "b@example.com"
        );
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo.update(UserId::new(), UserChanges::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("test@example.com")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.find_all().await.unwrap().is_empty());
    }
}
