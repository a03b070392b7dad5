use warp::http::StatusCode;
use warp::reply::{self, Reply, Response};

use crate::service::PollService;
use crate::voting::{PollId, UserId};
use super::models;

pub fn get_results(poll_id: i32, polls: PollService) -> Response {
    match polls.get_poll_results(PollId(poll_id)) {
        Ok(Some(results)) => reply::json(&results).into_response(),
        Ok(None) => models::json_error("Poll not found", StatusCode::NOT_FOUND),
        Err(err) => models::service_error(err),
    }
}

pub fn dashboard(user_id: i32, polls: PollService) -> Response {
    match polls.user_dashboard(UserId(user_id)) {
        Ok(summary) => reply::json(&summary).into_response(),
        Err(err) => models::service_error(err),
    }
}
