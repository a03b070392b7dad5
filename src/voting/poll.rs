use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{self, ValidationError};
use super::id::{OptionId, PollId};
use super::user::User;
use super::vote::Vote;

pub const TITLE_LIMITS: RangeInclusive<usize> = 1..=200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const OPTION_COUNT_LIMITS: RangeInclusive<usize> = 2..=10;
pub const OPTION_TEXT_LIMITS: RangeInclusive<usize> = 1..=500;

/// A poll with its creator, options, and votes fully materialized. Queries
/// hand back disconnected values, so nothing here is lazily loaded.
#[derive(Clone, Debug, Serialize)]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub description: String,
    pub creator: User,
    pub options: Vec<PollOption>,
    pub votes: Vec<Vote>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One selectable choice, immutable after the poll is created.
#[derive(Clone, Debug, Serialize)]
pub struct PollOption {
    pub id: OptionId,
    pub poll_id: PollId,
    pub text: String,
}

/// Poll fields as they arrive off the wire, before validation.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct PollDraft {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
}

/// Poll fields that passed the field limits, ready to persist. Blank option
/// entries are dropped before the count check, matching the original form
/// with its fixed row of optional inputs.
#[derive(Clone, Debug)]
pub struct CreatePollSettings {
    pub title: String,
    pub description: String,
    pub options: Vec<String>,
}

impl TryFrom<PollDraft> for CreatePollSettings {
    type Error = ValidationError;

    fn try_from(draft: PollDraft) -> Result<CreatePollSettings, ValidationError> {
        let title = draft.title.trim().to_string();
        let description = draft.description.trim().to_string();
        let options: Vec<String> = draft.options.iter()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        let len = title.chars().count();
        if !TITLE_LIMITS.contains(&len) {
            return Err(error::poll_title_invalid_size(TITLE_LIMITS, len));
        }

        let len = description.chars().count();
        if len > DESCRIPTION_MAX {
            return Err(error::poll_description_too_long(DESCRIPTION_MAX, len));
        }

        if !OPTION_COUNT_LIMITS.contains(&options.len()) {
            return Err(error::poll_option_limit_exceeded(OPTION_COUNT_LIMITS, options.len()));
        }

        let mut seen = HashSet::new();
        for text in &options {
            let len = text.chars().count();
            if !OPTION_TEXT_LIMITS.contains(&len) {
                return Err(error::poll_option_invalid_size(OPTION_TEXT_LIMITS, len));
            }
            if !seen.insert(text.as_str()) {
                return Err(error::poll_duplicate_option(text));
            }
        }

        Ok(CreatePollSettings { title, description, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, options: &[&str]) -> PollDraft {
        PollDraft {
            title: title.to_string(),
            description: String::new(),
            options: options.iter().map(|text| text.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_a_plain_two_option_poll() {
        let settings = CreatePollSettings::try_from(draft("Lunch spot?", &["Tacos", "Ramen"])).unwrap();
        assert_eq!(settings.title, "Lunch spot?");
        assert_eq!(settings.options, vec!["Tacos", "Ramen"]);
    }

    #[test]
    fn drops_blank_options_before_counting() {
        let settings = CreatePollSettings::try_from(draft("Lunch spot?", &["Tacos", "", "  ", "Ramen"])).unwrap();
        assert_eq!(settings.options, vec!["Tacos", "Ramen"]);
    }

    #[test]
    fn rejects_a_single_option() {
        assert!(CreatePollSettings::try_from(draft("Lunch spot?", &["Tacos", "  "])).is_err());
    }

    #[test]
    fn rejects_more_than_ten_options() {
        let options: Vec<String> = (0..11).map(|i| format!("Option {i}")).collect();
        let refs: Vec<&str> = options.iter().map(String::as_str).collect();
        assert!(CreatePollSettings::try_from(draft("Too many", &refs)).is_err());
    }

    #[test]
    fn rejects_duplicate_option_text() {
        assert!(CreatePollSettings::try_from(draft("Lunch spot?", &["Tacos", "Tacos"])).is_err());
    }

    #[test]
    fn rejects_blank_title() {
        assert!(CreatePollSettings::try_from(draft("  ", &["Tacos", "Ramen"])).is_err());
    }

    #[test]
    fn rejects_oversized_title() {
        let long = "x".repeat(201);
        assert!(CreatePollSettings::try_from(draft(&long, &["Tacos", "Ramen"])).is_err());
    }

    #[test]
    fn rejects_oversized_description() {
        let mut input = draft("Lunch spot?", &["Tacos", "Ramen"]);
        input.description = "x".repeat(1001);
        assert!(CreatePollSettings::try_from(input).is_err());
    }

    #[test]
    fn keeps_option_input_order() {
        let settings = CreatePollSettings::try_from(draft("Order", &["C", "A", "B"])).unwrap();
        assert_eq!(settings.options, vec!["C", "A", "B"]);
    }
}
