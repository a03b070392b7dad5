//! Storage boundary for the poll domain.
//!
//! Every query returns owned, fully-materialized domain values; nothing a
//! caller receives stays bound to a connection. Writes that run into a
//! uniqueness constraint surface as [`StoreError::Conflict`] so callers can
//! tell "already taken" apart from a storage failure.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;

use crate::error::StoreError;
use crate::voting::{CreatePollSettings, CreateUser, OptionId, Poll, PollId, PollOption, User, UserId, Vote};

pub trait IdentityStore {
    /// Persist a new user with a generated id and timestamp.
    fn insert_user(&self, user: &CreateUser) -> Result<User, StoreError>;
    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// All users, ordered by username ascending.
    fn all_users(&self) -> Result<Vec<User>, StoreError>;
}

pub trait PollStore {
    /// Persist a poll and all of its options in one transaction, in input
    /// order. Returns the aggregate with an empty vote list.
    fn insert_poll(&self, settings: &CreatePollSettings, creator: UserId) -> Result<Poll, StoreError>;
    fn get_poll(&self, id: PollId) -> Result<Option<Poll>, StoreError>;
    /// All polls, newest first; ties broken by insertion order.
    fn all_polls(&self) -> Result<Vec<Poll>, StoreError>;
    /// Same ordering as [`PollStore::all_polls`], filtered to active polls.
    fn active_polls(&self) -> Result<Vec<Poll>, StoreError>;
    fn get_option(&self, id: OptionId) -> Result<Option<PollOption>, StoreError>;
    /// One-way flip of the active flag. A no-op for an unknown id.
    fn set_poll_inactive(&self, id: PollId) -> Result<(), StoreError>;
}

pub trait VoteStore {
    /// Record a vote. The backing (user, poll) uniqueness constraint makes a
    /// second write for the same pair fail with
    /// `Conflict(OneVotePerPoll)` even when two writers race.
    fn insert_vote(&self, poll: PollId, option: OptionId, user: UserId) -> Result<Vote, StoreError>;
    fn has_user_voted(&self, poll: PollId, user: UserId) -> Result<bool, StoreError>;
}

/// Everything the services need from one backend.
pub trait Store: IdentityStore + PollStore + VoteStore + Send + Sync {}

impl<T: IdentityStore + PollStore + VoteStore + Send + Sync> Store for T {}
