use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::service::{IdentityService, LoginOutcome};
use crate::voting::{CreateUser, UserDraft, UserId};
use super::models::{self, LoginRequest, LoginResponse};

/// Sign in or register in one step from a username+email claim.
pub fn login(req: LoginRequest, identity: IdentityService) -> Response {
    // same minimal shape check the original sign-in form applied
    if !req.email.contains('@') || !req.email.contains('.') {
        return models::json_error("Please enter a valid email address", StatusCode::UNPROCESSABLE_ENTITY);
    }

    let draft = UserDraft {
        username: req.username,
        email: req.email,
    };
    let user = match CreateUser::try_from(draft) {
        Ok(user) => user,
        Err(err) => return models::service_error(err.into()),
    };

    match identity.login_or_register(user) {
        Ok(LoginOutcome::SignedIn(user)) => {
            reply::json(&LoginResponse { user, registered: false }).into_response()
        }
        Ok(LoginOutcome::Registered(user)) => {
            let reply = reply::json(&LoginResponse { user, registered: true });
            reply::with_status(reply, StatusCode::CREATED).into_response()
        }
        Ok(LoginOutcome::EmailMismatch) => {
            models::json_error("Username exists with different email", StatusCode::UNAUTHORIZED)
        }
        Err(err) => models::service_error(err),
    }
}

pub fn list_users(identity: IdentityService) -> Response {
    match identity.get_all_users() {
        Ok(users) => reply::json(&users).into_response(),
        Err(err) => models::service_error(err),
    }
}

pub fn get_user(id: i32, identity: IdentityService) -> Response {
    match identity.get_user(UserId(id)) {
        Ok(Some(user)) => reply::json(&user).into_response(),
        Ok(None) => models::json_error("User not found", StatusCode::NOT_FOUND),
        Err(err) => models::service_error(err),
    }
}

pub fn get_user_by_username(username: String, identity: IdentityService) -> Response {
    match identity.get_user_by_username(&username) {
        Ok(Some(user)) => reply::json(&user).into_response(),
        Ok(None) => models::json_error("User not found", StatusCode::NOT_FOUND),
        Err(err) => models::service_error(err),
    }
}
