use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{self, ValidationError};
use super::id::UserId;

pub const USERNAME_LIMITS: RangeInclusive<usize> = 1..=50;
pub const EMAIL_LIMITS: RangeInclusive<usize> = 1..=255;

/// A registered user. Created once at first sign-in, never mutated after.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Signup fields as they arrive off the wire, before validation.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
}

/// Signup fields that passed the field limits.
#[derive(Clone, Debug)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
}

impl TryFrom<UserDraft> for CreateUser {
    type Error = ValidationError;

    fn try_from(draft: UserDraft) -> Result<CreateUser, ValidationError> {
        let username = draft.username.trim().to_string();
        let email = draft.email.trim().to_string();

        let len = username.chars().count();
        if !USERNAME_LIMITS.contains(&len) {
            return Err(error::username_invalid_size(USERNAME_LIMITS, len));
        }

        let len = email.chars().count();
        if !EMAIL_LIMITS.contains(&len) {
            return Err(error::email_invalid_size(EMAIL_LIMITS, len));
        }

        Ok(CreateUser { username, email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(username: &str, email: &str) -> UserDraft {
        UserDraft {
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn accepts_and_trims_fields() {
        let user = CreateUser::try_from(draft("  john_doe ", " john@example.com ")).unwrap();
        assert_eq!(user.username, "john_doe");
        assert_eq!(user.email, "john@example.com");
    }

    #[test]
    fn rejects_blank_username() {
        assert!(CreateUser::try_from(draft("   ", "john@example.com")).is_err());
    }

    #[test]
    fn rejects_blank_email() {
        assert!(CreateUser::try_from(draft("john_doe", "")).is_err());
    }

    #[test]
    fn rejects_oversized_username() {
        let long = "x".repeat(51);
        assert!(CreateUser::try_from(draft(&long, "john@example.com")).is_err());
        let max = "x".repeat(50);
        assert!(CreateUser::try_from(draft(&max, "john@example.com")).is_ok());
    }

    #[test]
    fn rejects_oversized_email() {
        let long = format!("{}@example.com", "x".repeat(250));
        assert!(CreateUser::try_from(draft("john_doe", &long)).is_err());
    }
}
