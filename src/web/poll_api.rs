use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::service::PollService;
use crate::voting::{CreatePollSettings, PollDraft, PollId, UserId};
use super::models::{self, CreatePollRequest, DeactivateRequest, DeactivateResponse};

pub fn create_poll(req: CreatePollRequest, polls: PollService) -> Response {
    let draft = PollDraft {
        title: req.title,
        description: req.description,
        options: req.options,
    };
    let settings = match CreatePollSettings::try_from(draft) {
        Ok(settings) => settings,
        Err(err) => return models::service_error(err.into()),
    };

    match polls.create_poll(settings, UserId(req.creator_id)) {
        Ok(poll) => reply::with_status(reply::json(&poll), StatusCode::CREATED).into_response(),
        Err(err) => models::service_error(err),
    }
}

pub fn list_polls(polls: PollService) -> Response {
    match polls.get_all_polls() {
        Ok(all) => reply::json(&all).into_response(),
        Err(err) => models::service_error(err),
    }
}

pub fn list_active_polls(polls: PollService) -> Response {
    match polls.get_active_polls() {
        Ok(active) => reply::json(&active).into_response(),
        Err(err) => models::service_error(err),
    }
}

pub fn get_poll(id: i32, polls: PollService) -> Response {
    match polls.get_poll(PollId(id)) {
        Ok(Some(poll)) => reply::json(&poll).into_response(),
        Ok(None) => models::json_error("Poll not found", StatusCode::NOT_FOUND),
        Err(err) => models::service_error(err),
    }
}

/// `deactivated: false` covers both an unknown poll and a caller who is not
/// the creator; neither is an error to the service.
pub fn deactivate_poll(id: i32, req: DeactivateRequest, polls: PollService) -> Response {
    match polls.deactivate_poll(PollId(id), UserId(req.user_id)) {
        Ok(deactivated) => reply::json(&DeactivateResponse { deactivated }).into_response(),
        Err(err) => models::service_error(err),
    }
}
