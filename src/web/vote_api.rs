use warp::reply::{self, Reply, Response};

use crate::service::PollService;
use crate::voting::{OptionId, PollId, UserId};
use super::models::{self, HasVotedResponse, VoteRequest, VoteResponse};

/// `recorded: false` means the user had already voted on this poll.
pub fn cast_vote(poll_id: i32, req: VoteRequest, polls: PollService) -> Response {
    match polls.cast_vote(PollId(poll_id), OptionId(req.option_id), UserId(req.user_id)) {
        Ok(recorded) => reply::json(&VoteResponse { recorded }).into_response(),
        Err(err) => models::service_error(err),
    }
}

pub fn has_voted(poll_id: i32, user_id: i32, polls: PollService) -> Response {
    match polls.has_user_voted(PollId(poll_id), UserId(user_id)) {
        Ok(has_voted) => reply::json(&HasVotedResponse { has_voted }).into_response(),
        Err(err) => models::service_error(err),
    }
}
