//! In-memory store with the same constraint behavior as the PostgreSQL
//! backend. Backs the test suite and the no-database demo mode.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use diesel::result::Error as DbError;

use crate::error::{Conflict, StoreError};
use crate::voting;
use crate::voting::{CreatePollSettings, CreateUser, OptionId, PollId, PollOption, User, UserId, Vote, VoteId};
use super::{IdentityStore, PollStore, VoteStore};

struct PollRecord {
    id: PollId,
    title: String,
    description: String,
    creator_id: UserId,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    polls: Vec<PollRecord>,
    options: Vec<PollOption>,
    votes: Vec<Vote>,
}

impl State {
    fn aggregate(&self, record: &PollRecord) -> Result<voting::Poll, StoreError> {
        let creator = self.users.iter()
            .find(|user| user.id == record.creator_id)
            .cloned()
            .ok_or(StoreError::Database(DbError::NotFound))?;
        let options = self.options.iter()
            .filter(|option| option.poll_id == record.id)
            .cloned()
            .collect();
        let votes = self.votes.iter()
            .filter(|vote| vote.poll_id == record.id)
            .cloned()
            .collect();

        Ok(voting::Poll {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            creator,
            options,
            votes,
            is_active: record.is_active,
            created_at: record.created_at,
        })
    }

    fn sorted_polls(&self) -> Vec<&PollRecord> {
        let mut records: Vec<&PollRecord> = self.polls.iter().collect();
        // newest first, insertion order on a timestamp tie
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        records
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("state mutex poisoned")
    }
}

impl Default for MemoryStore {
    fn default() -> MemoryStore {
        MemoryStore::new()
    }
}

impl IdentityStore for MemoryStore {
    fn insert_user(&self, user: &CreateUser) -> Result<User, StoreError> {
        let mut state = self.state();
        if state.users.iter().any(|existing| existing.username == user.username) {
            return Err(StoreError::Conflict(Conflict::Username));
        }
        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(Conflict::Email));
        }

        let row = User {
            id: UserId(state.users.len() as i32 + 1),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        state.users.push(row.clone());
        Ok(row)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state().users.iter().find(|user| user.id == id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state().users.iter().find(|user| user.username == username).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state().users.iter().find(|user| user.email == email).cloned())
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.state().users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

impl PollStore for MemoryStore {
    fn insert_poll(&self, settings: &CreatePollSettings, creator: UserId) -> Result<voting::Poll, StoreError> {
        let mut state = self.state();
        let creator_row = state.users.iter()
            .find(|user| user.id == creator)
            .cloned()
            .ok_or(StoreError::Database(DbError::NotFound))?;

        let record = PollRecord {
            id: PollId(state.polls.len() as i32 + 1),
            title: settings.title.clone(),
            description: settings.description.clone(),
            creator_id: creator,
            is_active: true,
            created_at: Utc::now(),
        };

        let mut options = vec![];
        for text in &settings.options {
            let option = PollOption {
                id: OptionId(state.options.len() as i32 + options.len() as i32 + 1),
                poll_id: record.id,
                text: text.clone(),
            };
            options.push(option);
        }
        state.options.extend(options.iter().cloned());

        let poll = voting::Poll {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            creator: creator_row,
            options,
            votes: vec![],
            is_active: true,
            created_at: record.created_at,
        };
        state.polls.push(record);
        Ok(poll)
    }

    fn get_poll(&self, id: PollId) -> Result<Option<voting::Poll>, StoreError> {
        let state = self.state();
        match state.polls.iter().find(|record| record.id == id) {
            Some(record) => state.aggregate(record).map(Some),
            None => Ok(None),
        }
    }

    fn all_polls(&self) -> Result<Vec<voting::Poll>, StoreError> {
        let state = self.state();
        state.sorted_polls().into_iter()
            .map(|record| state.aggregate(record))
            .collect()
    }

    fn active_polls(&self) -> Result<Vec<voting::Poll>, StoreError> {
        let state = self.state();
        state.sorted_polls().into_iter()
            .filter(|record| record.is_active)
            .map(|record| state.aggregate(record))
            .collect()
    }

    fn get_option(&self, id: OptionId) -> Result<Option<PollOption>, StoreError> {
        Ok(self.state().options.iter().find(|option| option.id == id).cloned())
    }

    fn set_poll_inactive(&self, id: PollId) -> Result<(), StoreError> {
        let mut state = self.state();
        if let Some(record) = state.polls.iter_mut().find(|record| record.id == id) {
            record.is_active = false;
        }
        Ok(())
    }
}

impl VoteStore for MemoryStore {
    fn insert_vote(&self, poll: PollId, option: OptionId, user: UserId) -> Result<Vote, StoreError> {
        // check and write under one lock, like the database constraint
        let mut state = self.state();
        if state.votes.iter().any(|vote| vote.poll_id == poll && vote.user_id == user) {
            return Err(StoreError::Conflict(Conflict::OneVotePerPoll));
        }

        let vote = Vote {
            id: VoteId(state.votes.len() as i32 + 1),
            user_id: user,
            poll_id: poll,
            option_id: option,
            created_at: Utc::now(),
        };
        state.votes.push(vote.clone());
        Ok(vote)
    }

    fn has_user_voted(&self, poll: PollId, user: UserId) -> Result<bool, StoreError> {
        Ok(self.state().votes.iter().any(|vote| vote.poll_id == poll && vote.user_id == user))
    }
}
