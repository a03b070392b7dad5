use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::error::ServiceError;
use crate::voting::User;

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub registered: bool,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CreatePollRequest {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
    pub creator_id: i32,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub option_id: i32,
    pub user_id: i32,
}

#[derive(Serialize)]
pub struct VoteResponse {
    pub recorded: bool,
}

#[derive(Deserialize)]
pub struct DeactivateRequest {
    pub user_id: i32,
}

#[derive(Serialize)]
pub struct DeactivateResponse {
    pub deactivated: bool,
}

#[derive(Serialize)]
pub struct HasVotedResponse {
    pub has_voted: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn json_error(message: impl Into<String>, code: StatusCode) -> Response {
    reply::with_status(reply::json(&ErrorResponse { error: message.into() }), code).into_response()
}

/// Translate a service failure into the response the caller sees.
pub fn service_error(err: ServiceError) -> Response {
    let code = match &err {
        ServiceError::CreatorNotFound
        | ServiceError::UserNotFound
        | ServiceError::PollNotFound
        | ServiceError::OptionNotFound => StatusCode::NOT_FOUND,
        ServiceError::OptionPollMismatch => StatusCode::BAD_REQUEST,
        ServiceError::PollInactive
        | ServiceError::DuplicateUsername
        | ServiceError::DuplicateEmail => StatusCode::CONFLICT,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if code == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed on storage");
    }

    json_error(err.to_string(), code)
}
