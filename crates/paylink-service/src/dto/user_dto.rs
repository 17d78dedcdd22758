//! User-related DTOs.

use chrono::{DateTime, Utc};
use paylink_core::rules::not_blank;
use paylink_core::UserId;
use paylink_repository::{NewUser, User, UserChanges};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 100, message = "First name is required"),
        custom(function = "not_blank")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = 100, message = "Last name is required"),
        custom(function = "not_blank")
    )]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
}

impl CreateUserRequest {
    /// Builds the record to store; `password_hash` replaces the plain password.
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password_hash,
        }
    }
}

/// Partial update of a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Profile changes; a new password arrives already hashed.
    pub fn into_changes(self, password_hash: Option<String>) -> UserChanges {
        UserChanges {
            first_name: self.first_name.map(|s| s.trim().to_string()),
            last_name: self.last_name.map(|s| s.trim().to_string()),
            email: self.email.map(|s| s.trim().to_string()),
            password_hash,
        }
    }
}

/// User as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Result of deleting a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_core::ValidateExt;

    #[test]
    fn test_create_request_validation() {
        let valid = CreateUserRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(valid.validate_request().is_ok());

        let blank_name = CreateUserRequest {
            first_name: "   ".to_string(),
            ..valid.clone()
        };
        assert!(blank_name.validate_request().is_err());

        let short_password = CreateUserRequest {
            password: "short".to_string(),
            ..valid.clone()
        };
        assert!(short_password.validate_request().is_err());

        let bad_email = CreateUserRequest {
            email: "not-an-email".to_string(),
            ..valid
        };
        let err = bad_email.validate_request().unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_update_request_allows_empty() {
        assert!(UpdateUserRequest::default().validate_request().is_ok());

        let empty_name = UpdateUserRequest {
            first_name: Some(String::new()),
            ..UpdateUserRequest::default()
        };
        assert!(empty_name.validate_request().is_err());
    }

    #[test]
    fn test_create_request_is_trimmed() {
        let new_user = CreateUserRequest {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: " ada@example.com".to_string(),
            password: "correct horse".to_string(),
        }
        .into_new_user("$argon2id$stub".to_string());
        assert_eq!(new_user.first_name, "Ada");
        assert_eq!(new_user.email, "ada@example.com");
        assert_eq!(new_user.password_hash, "$argon2id$stub");
    }
}
