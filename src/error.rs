use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::ops::RangeInclusive;

use diesel::result::{ConnectionError, Error as DbError};

/// Rejected input: a field that falls outside the documented limits.
#[derive(Debug)]
pub struct ValidationError {
    message: String,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error: {}", self.message)
    }
}

impl Error for ValidationError {}

pub fn poll_title_invalid_size(limits: RangeInclusive<usize>, len: usize) -> ValidationError {
    ValidationError {
        message: format!("poll's title must be between {} and {} characters, got {len}", limits.start(), limits.end()),
    }
}

pub fn poll_description_too_long(max: usize, len: usize) -> ValidationError {
    ValidationError {
        message: format!("poll's description must be at most {max} characters, got {len}"),
    }
}

pub fn poll_option_limit_exceeded(limits: RangeInclusive<usize>, count: usize) -> ValidationError {
    ValidationError {
        message: format!("poll must have between {} and {} options, got {count}", limits.start(), limits.end()),
    }
}

pub fn poll_option_invalid_size(limits: RangeInclusive<usize>, len: usize) -> ValidationError {
    ValidationError {
        message: format!("poll option text must be between {} and {} characters, got {len}", limits.start(), limits.end()),
    }
}

pub fn poll_duplicate_option(text: &str) -> ValidationError {
    ValidationError {
        message: format!("poll options must be unique, got '{text}' more than once"),
    }
}

pub fn username_invalid_size(limits: RangeInclusive<usize>, len: usize) -> ValidationError {
    ValidationError {
        message: format!("username must be between {} and {} characters, got {len}", limits.start(), limits.end()),
    }
}

pub fn email_invalid_size(limits: RangeInclusive<usize>, len: usize) -> ValidationError {
    ValidationError {
        message: format!("email must be between {} and {} characters, got {len}", limits.start(), limits.end()),
    }
}

/// The uniqueness constraint a write ran into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Conflict {
    Username,
    Email,
    OneVotePerPoll,
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::Username => write!(f, "username already taken"),
            Conflict::Email => write!(f, "email already taken"),
            Conflict::OneVotePerPoll => write!(f, "one vote per user per poll"),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// A named uniqueness constraint rejected the write.
    Conflict(Conflict),
    Connection(ConnectionError),
    Database(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict(conflict) => write!(f, "constraint violated: {conflict}"),
            StoreError::Connection(err) => write!(f, "could not connect to the database: {err}"),
            StoreError::Database(err) => write!(f, "database error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Conflict(_) => None,
            StoreError::Connection(err) => Some(err),
            StoreError::Database(err) => Some(err),
        }
    }
}

/// Failure vocabulary of the service layer. Every variant except `Store` is a
/// caller-input problem the web layer translates into a user-facing message.
#[derive(Debug)]
pub enum ServiceError {
    CreatorNotFound,
    UserNotFound,
    PollNotFound,
    PollInactive,
    OptionNotFound,
    OptionPollMismatch,
    DuplicateUsername,
    DuplicateEmail,
    Validation(ValidationError),
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::CreatorNotFound => write!(f, "Creator not found"),
            ServiceError::UserNotFound => write!(f, "User not found"),
            ServiceError::PollNotFound => write!(f, "Poll not found"),
            ServiceError::PollInactive => write!(f, "Poll is not active"),
            ServiceError::OptionNotFound => write!(f, "Option not found"),
            ServiceError::OptionPollMismatch => write!(f, "Option does not belong to this poll"),
            ServiceError::DuplicateUsername => write!(f, "Username already exists"),
            ServiceError::DuplicateEmail => write!(f, "Email already exists"),
            ServiceError::Validation(err) => write!(f, "{err}"),
            ServiceError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServiceError::Validation(err) => Some(err),
            ServiceError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> ServiceError {
        ServiceError::Validation(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> ServiceError {
        match err {
            StoreError::Conflict(Conflict::Username) => ServiceError::DuplicateUsername,
            StoreError::Conflict(Conflict::Email) => ServiceError::DuplicateEmail,
            other => ServiceError::Store(other),
        }
    }
}
