use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::{OptionId, PollId, UserId, VoteId};

/// One user's single vote on a poll. Append-only: never updated or deleted
/// once cast, and at most one exists per (user, poll) pair.
#[derive(Clone, Debug, Serialize)]
pub struct Vote {
    pub id: VoteId,
    pub user_id: UserId,
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub created_at: DateTime<Utc>,
}
