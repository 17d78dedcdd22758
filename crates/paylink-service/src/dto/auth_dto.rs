//! Authentication DTOs.

use super::UserResponse;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials exchanged for an access token.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: String,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use paylink_core::ValidateExt;

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(valid.validate_request().is_ok());

        let empty_password = LoginRequest {
            password: String::new(),
            ..valid
        };
        assert!(empty_password.validate_request().is_err());
    }
}
