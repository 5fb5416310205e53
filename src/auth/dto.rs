use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::ValidationErrors;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// Field checks only; email uniqueness is checked against the database
    /// by the handler and pushed into the same accumulator.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "The name field is required.");
        } else if self.name.chars().count() > 255 {
            errors.push("name", "The name may not be greater than 255 characters.");
        }
        if self.email.is_empty() {
            errors.push("email", "The email field is required.");
        } else if !is_valid_email(&self.email) {
            errors.push("email", "The email must be a valid email address.");
        } else if self.email.chars().count() > 255 {
            errors.push("email", "The email may not be greater than 255 characters.");
        }
        if self.password.is_empty() {
            errors.push("password", "The password field is required.");
        } else if self.password.len() < 8 {
            errors.push("password", "The password must be at least 8 characters.");
        }
        errors
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.email.is_empty() {
            errors.push("email", "The email field is required.");
        } else if !is_valid_email(&self.email) {
            errors.push("email", "The email must be a valid email address.");
        }
        if self.password.is_empty() {
            errors.push("password", "The password field is required.");
        }
        errors
    }
}

/// Public part of the user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub status: bool,
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: bool,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("user.name+tag@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
    }

    #[test]
    fn register_accumulates_all_field_errors() {
        let payload = RegisterRequest {
            name: "".into(),
            email: "nope".into(),
            password: "short".into(),
        };
        let errors = payload.validate();
        let json = serde_json::to_value(&errors).unwrap();
        assert!(json.get("name").is_some());
        assert!(json.get("email").is_some());
        assert!(json.get("password").is_some());
    }

    #[test]
    fn name_limit_counts_characters_not_bytes() {
        let payload = RegisterRequest {
            name: "ü".repeat(255),
            email: "ada@example.com".into(),
            password: "longenough".into(),
        };
        assert!(payload.validate().is_empty());

        let payload = RegisterRequest {
            name: "ü".repeat(256),
            email: "ada@example.com".into(),
            password: "longenough".into(),
        };
        let json = serde_json::to_value(&payload.validate()).unwrap();
        assert_eq!(json["name"][0], "The name may not be greater than 255 characters.");
    }

    #[test]
    fn register_valid_payload_passes() {
        let payload = RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "longenough".into(),
        };
        assert!(payload.validate().is_empty());
    }

    #[test]
    fn login_requires_both_fields() {
        let payload = LoginRequest {
            email: "".into(),
            password: "".into(),
        };
        let json = serde_json::to_value(&payload.validate()).unwrap();
        assert_eq!(json["email"][0], "The email field is required.");
        assert_eq!(json["password"][0], "The password field is required.");
    }
}
