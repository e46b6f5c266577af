pub mod extractors;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Role, UserSummary};

// Re-export necessary items
pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for the admin-only register and create-user
/// endpoints. The created account gets no token; it logs in separately.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name for the new account.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address for the new account. Doubles as the login key and the
    /// task-assignment key, and must be unique.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
    /// Role of the new account.
    pub role: Role,
}

/// Response structure after a successful login: the bearer token and a
/// non-sensitive summary of the authenticated user.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT (JSON Web Token) for session authentication.
    pub token: String,
    /// Summary of the authenticated user (id, name, email, role).
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let short_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
            role: Role::User,
        };
        assert!(valid_register.validate().is_ok());

        let empty_name_register = RegisterRequest {
            name: "".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
            role: Role::User,
        };
        assert!(empty_name_register.validate().is_err());

        let bad_email_register = RegisterRequest {
            name: "Test User".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            role: Role::Admin,
        };
        assert!(bad_email_register.validate().is_err());

        let short_password_register = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "123".to_string(),
            role: Role::User,
        };
        assert!(short_password_register.validate().is_err());
    }
}
