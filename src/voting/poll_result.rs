use serde::Serialize;

use super::id::{OptionId, PollId};
use super::poll::Poll;

/// Tallied outcome of a poll, computed on demand and never stored.
#[derive(Clone, Debug, Serialize)]
pub struct PollResults {
    pub poll_id: PollId,
    pub title: String,
    pub description: String,
    pub total_votes: i64,
    pub options: Vec<OptionResult>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptionResult {
    pub option_id: OptionId,
    pub text: String,
    pub vote_count: i64,
    pub percentage: f64,
}

impl PollResults {
    /// Count votes per option, in the poll's stored option order.
    ///
    /// Percentages are rounded to two decimals independently per option and
    /// never normalized, so a three-way near-tie can sum to 99.99 or 100.01.
    pub fn evaluate(poll: &Poll) -> PollResults {
        let total_votes = poll.votes.len() as i64;

        let options = poll.options.iter()
            .map(|option| {
                let vote_count = poll.votes.iter()
                    .filter(|vote| vote.option_id == option.id)
                    .count() as i64;
                OptionResult {
                    option_id: option.id,
                    text: option.text.clone(),
                    vote_count,
                    percentage: percentage(vote_count, total_votes),
                }
            })
            .collect();

        PollResults {
            poll_id: poll.id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            total_votes,
            options,
        }
    }
}

fn percentage(count: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10_000.0).round() / 100.0
}
