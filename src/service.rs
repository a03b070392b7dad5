//! Identity and poll services: the business rules layered over the storage
//! boundary. Every operation takes the acting user id explicitly and holds
//! no per-request state, so the services are plain values cloned into each
//! handler.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Conflict, ServiceError, StoreError};
use crate::store::Store;
use crate::voting::{CreatePollSettings, CreateUser, OptionId, Poll, PollId, PollResults, User, UserId};

/// Outcome of the identify-by-claim sign-in. This is not credential
/// verification: whoever presents a username together with its stored email
/// is treated as that user. A deliberate simplification, not a security
/// boundary.
#[derive(Debug)]
pub enum LoginOutcome {
    SignedIn(User),
    Registered(User),
    EmailMismatch,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>) -> IdentityService {
        IdentityService { store }
    }

    /// Duplicate username is reported before duplicate email; the store's
    /// uniqueness constraints back both checks when callers race.
    pub fn create_user(&self, user: CreateUser) -> Result<User, ServiceError> {
        if self.store.get_user_by_username(&user.username)?.is_some() {
            return Err(ServiceError::DuplicateUsername);
        }
        if self.store.get_user_by_email(&user.email)?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        Ok(self.store.insert_user(&user)?)
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>, ServiceError> {
        Ok(self.store.get_user(id)?)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.get_user_by_username(username)?)
    }

    /// All users, ordered by username ascending.
    pub fn get_all_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.store.all_users()?)
    }

    /// Sign in or register in one step: an existing username requires its
    /// stored email to match case-insensitively, an unknown username
    /// registers a new user. A mismatch is a denial, not an error.
    pub fn login_or_register(&self, user: CreateUser) -> Result<LoginOutcome, ServiceError> {
        if let Some(existing) = self.store.get_user_by_username(&user.username)? {
            if existing.email.to_lowercase() == user.email.to_lowercase() {
                return Ok(LoginOutcome::SignedIn(existing));
            }
            warn!(username = %user.username, "login denied: email does not match");
            return Ok(LoginOutcome::EmailMismatch);
        }

        let user = self.create_user(user)?;
        info!(username = %user.username, id = %user.id, "registered new user");
        Ok(LoginOutcome::Registered(user))
    }
}

/// Per-user rollup for the dashboard: what they created, what those polls
/// received, and which active polls still await their vote.
#[derive(Clone, Debug, serde::Serialize)]
pub struct DashboardSummary {
    pub polls_created: usize,
    pub active_polls_created: usize,
    pub votes_received: usize,
    pub polls_voted: usize,
    pub open_polls: Vec<Poll>,
}

#[derive(Clone)]
pub struct PollService {
    store: Arc<dyn Store>,
}

impl PollService {
    pub fn new(store: Arc<dyn Store>) -> PollService {
        PollService { store }
    }

    /// Persist a poll and its options in one transaction. The returned
    /// aggregate carries the options in input order and no votes yet.
    pub fn create_poll(&self, settings: CreatePollSettings, creator: UserId) -> Result<Poll, ServiceError> {
        if self.store.get_user(creator)?.is_none() {
            return Err(ServiceError::CreatorNotFound);
        }

        Ok(self.store.insert_poll(&settings, creator)?)
    }

    pub fn get_poll(&self, id: PollId) -> Result<Option<Poll>, ServiceError> {
        Ok(self.store.get_poll(id)?)
    }

    /// All polls, newest first; ties broken by insertion order.
    pub fn get_all_polls(&self) -> Result<Vec<Poll>, ServiceError> {
        Ok(self.store.all_polls()?)
    }

    pub fn get_active_polls(&self) -> Result<Vec<Poll>, ServiceError> {
        Ok(self.store.active_polls()?)
    }

    pub fn has_user_voted(&self, poll: PollId, user: UserId) -> Result<bool, ServiceError> {
        Ok(self.store.has_user_voted(poll, user)?)
    }

    /// Record a vote. `Ok(false)` means the user already voted, whether that
    /// was visible up front or surfaced as a constraint conflict from a
    /// racing write. The check order is fixed: existence and activity checks
    /// come before the already-voted check, which comes before the write.
    pub fn cast_vote(&self, poll_id: PollId, option_id: OptionId, user_id: UserId) -> Result<bool, ServiceError> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let poll = self.store.get_poll(poll_id)?.ok_or(ServiceError::PollNotFound)?;
        if !poll.is_active {
            return Err(ServiceError::PollInactive);
        }

        let option = self.store.get_option(option_id)?.ok_or(ServiceError::OptionNotFound)?;
        if option.poll_id != poll_id {
            return Err(ServiceError::OptionPollMismatch);
        }

        if self.store.has_user_voted(poll_id, user_id)? {
            return Ok(false);
        }

        match self.store.insert_vote(poll_id, option_id, user_id) {
            Ok(_) => Ok(true),
            // the (user, poll) constraint closed a double-vote race
            Err(StoreError::Conflict(Conflict::OneVotePerPoll)) => {
                debug!(poll = %poll_id, user = %user_id, "concurrent double vote rejected");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Tally the poll on demand, or `None` for an unknown poll.
    pub fn get_poll_results(&self, id: PollId) -> Result<Option<PollResults>, ServiceError> {
        Ok(self.store.get_poll(id)?.map(|poll| PollResults::evaluate(&poll)))
    }

    /// Only the creator may deactivate, and the flag never flips back. A
    /// missing poll or a non-creator caller is an ordinary `false`.
    pub fn deactivate_poll(&self, poll_id: PollId, user_id: UserId) -> Result<bool, ServiceError> {
        let Some(poll) = self.store.get_poll(poll_id)? else {
            return Ok(false);
        };
        if poll.creator.id != user_id {
            return Ok(false);
        }

        self.store.set_poll_inactive(poll_id)?;
        Ok(true)
    }

    /// Read-only rollup composed from the primitive queries.
    pub fn user_dashboard(&self, user_id: UserId) -> Result<DashboardSummary, ServiceError> {
        if self.store.get_user(user_id)?.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        let polls = self.store.all_polls()?;
        let mine: Vec<&Poll> = polls.iter().filter(|poll| poll.creator.id == user_id).collect();
        let polls_created = mine.len();
        let active_polls_created = mine.iter().filter(|poll| poll.is_active).count();
        let votes_received = mine.iter().map(|poll| poll.votes.len()).sum();
        let polls_voted = polls.iter()
            .filter(|poll| poll.votes.iter().any(|vote| vote.user_id == user_id))
            .count();
        let open_polls = polls.into_iter()
            .filter(|poll| poll.is_active && !poll.votes.iter().any(|vote| vote.user_id == user_id))
            .collect();

        Ok(DashboardSummary {
            polls_created,
            active_polls_created,
            votes_received,
            polls_voted,
            open_polls,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use crate::store::memory::MemoryStore;
    use crate::voting::{PollDraft, UserDraft};
    use super::*;

    fn services() -> (IdentityService, PollService) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        (IdentityService::new(store.clone()), PollService::new(store))
    }

    fn create_user(username: &str, email: &str) -> CreateUser {
        CreateUser::try_from(UserDraft {
            username: username.to_string(),
            email: email.to_string(),
        })
        .unwrap()
    }

    fn user(identity: &IdentityService, username: &str, email: &str) -> User {
        identity.create_user(create_user(username, email)).unwrap()
    }

    fn settings(title: &str, options: &[&str]) -> CreatePollSettings {
        CreatePollSettings::try_from(PollDraft {
            title: title.to_string(),
            description: String::new(),
            options: options.iter().map(|text| text.to_string()).collect(),
        })
        .unwrap()
    }

    fn language_poll(polls: &PollService, creator: UserId) -> Poll {
        let draft = PollDraft {
            title: "Favorite Programming Language".to_string(),
            description: "Choose your favorite programming language".to_string(),
            options: vec![
                "Python".to_string(),
                "JavaScript".to_string(),
                "Java".to_string(),
                "C++".to_string(),
            ],
        };
        polls
            .create_poll(CreatePollSettings::try_from(draft).unwrap(), creator)
            .unwrap()
    }

    fn option_id(poll: &Poll, text: &str) -> OptionId {
        poll.options.iter().find(|option| option.text == text).unwrap().id
    }

    #[test]
    fn create_user_assigns_id_and_timestamp() {
        let (identity, _) = services();

        let user = identity.create_user(create_user("john_doe", "john@example.com")).unwrap();
        assert_eq!(user.username, "john_doe");
        assert_eq!(user.email, "john@example.com");
        assert!(user.id.0 > 0);
    }

    #[test]
    fn create_user_rejects_duplicate_username() {
        let (identity, _) = services();
        user(&identity, "john_doe", "john@example.com");

        let err = identity.create_user(create_user("john_doe", "different@example.com")).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateUsername));
    }

    #[test]
    fn create_user_rejects_duplicate_email() {
        let (identity, _) = services();
        user(&identity, "john_doe", "john@example.com");

        let err = identity.create_user(create_user("different_user", "john@example.com")).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));
    }

    #[test]
    fn get_user_finds_by_id() {
        let (identity, _) = services();
        let created = user(&identity, "testuser", "test@example.com");

        let found = identity.get_user(created.id).unwrap().unwrap();
        assert_eq!(found.username, "testuser");
        assert_eq!(found.email, "test@example.com");
    }

    #[test]
    fn get_user_unknown_id_is_none() {
        let (identity, _) = services();
        assert!(identity.get_user(UserId(999)).unwrap().is_none());
    }

    #[test]
    fn get_user_by_username_finds_user() {
        let (identity, _) = services();
        let created = user(&identity, "testuser", "test@example.com");

        let found = identity.get_user_by_username("testuser").unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn get_user_by_username_unknown_is_none() {
        let (identity, _) = services();
        assert!(identity.get_user_by_username("nonexistent").unwrap().is_none());
    }

    #[test]
    fn get_all_users_sorted_by_username() {
        let (identity, _) = services();
        user(&identity, "bob", "bob@example.com");
        user(&identity, "alice", "alice@example.com");

        let usernames: Vec<String> = identity.get_all_users().unwrap()
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(usernames, vec!["alice", "bob"]);
    }

    #[test]
    fn login_signs_in_when_email_matches_case_insensitively() {
        let (identity, _) = services();
        let created = user(&identity, "alice", "Alice@Example.com");

        let outcome = identity.login_or_register(create_user("alice", "alice@example.COM")).unwrap();
        match outcome {
            LoginOutcome::SignedIn(user) => assert_eq!(user.id, created.id),
            other => panic!("expected sign-in, got {other:?}"),
        }
    }

    #[test]
    fn login_denies_mismatched_email_without_creating_a_user() {
        let (identity, _) = services();
        user(&identity, "alice", "alice@example.com");

        let outcome = identity.login_or_register(create_user("alice", "impostor@example.com")).unwrap();
        assert!(matches!(outcome, LoginOutcome::EmailMismatch));
        assert_eq!(identity.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn login_registers_unknown_username() {
        let (identity, _) = services();

        let outcome = identity.login_or_register(create_user("newcomer", "new@example.com")).unwrap();
        match outcome {
            LoginOutcome::Registered(user) => assert_eq!(user.username, "newcomer"),
            other => panic!("expected registration, got {other:?}"),
        }
        assert_eq!(identity.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn login_rejects_email_registered_under_another_username() {
        let (identity, _) = services();
        user(&identity, "alice", "alice@example.com");

        let err = identity.login_or_register(create_user("alice2", "alice@example.com")).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));
    }

    #[test]
    fn create_poll_returns_options_in_input_order() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");

        let poll = language_poll(&polls, creator.id);
        assert!(poll.is_active);
        assert_eq!(poll.creator.id, creator.id);
        assert!(poll.votes.is_empty());

        let texts: Vec<&str> = poll.options.iter().map(|option| option.text.as_str()).collect();
        assert_eq!(texts, vec!["Python", "JavaScript", "Java", "C++"]);
        for option in &poll.options {
            assert_eq!(option.poll_id, poll.id);
        }
    }

    #[test]
    fn create_poll_unknown_creator_persists_nothing() {
        let (_, polls) = services();

        let err = polls.create_poll(settings("Orphan", &["A", "B"]), UserId(999)).unwrap_err();
        assert!(matches!(err, ServiceError::CreatorNotFound));
        assert!(polls.get_all_polls().unwrap().is_empty());
    }

    #[test]
    fn get_poll_unknown_id_is_none() {
        let (_, polls) = services();
        assert!(polls.get_poll(PollId(999)).unwrap().is_none());
    }

    #[test]
    fn get_poll_returns_the_full_aggregate() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let created = language_poll(&polls, creator.id);

        let fetched = polls.get_poll(created.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Favorite Programming Language");
        assert_eq!(fetched.creator.username, "creator");
        assert_eq!(fetched.options.len(), 4);
    }

    #[test]
    fn get_all_polls_newest_first() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");

        polls.create_poll(settings("Poll 1", &["A", "B"]), creator.id).unwrap();
        thread::sleep(Duration::from_millis(5));
        polls.create_poll(settings("Poll 2", &["X", "Y"]), creator.id).unwrap();

        let titles: Vec<String> = polls.get_all_polls().unwrap()
            .into_iter()
            .map(|poll| poll.title)
            .collect();
        assert_eq!(titles, vec!["Poll 2", "Poll 1"]);
    }

    #[test]
    fn get_active_polls_filters_deactivated() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");

        polls.create_poll(settings("Active Poll", &["A", "B"]), creator.id).unwrap();
        let inactive = polls.create_poll(settings("Inactive Poll", &["X", "Y"]), creator.id).unwrap();
        assert!(polls.deactivate_poll(inactive.id, creator.id).unwrap());

        let active = polls.get_active_polls().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Active Poll");
    }

    #[test]
    fn cast_vote_records_and_reports_true() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");
        let poll = language_poll(&polls, creator.id);

        assert!(!polls.has_user_voted(poll.id, voter.id).unwrap());
        assert!(polls.cast_vote(poll.id, poll.options[0].id, voter.id).unwrap());
        assert!(polls.has_user_voted(poll.id, voter.id).unwrap());
    }

    #[test]
    fn cast_vote_second_attempt_returns_false() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");
        let poll = language_poll(&polls, creator.id);

        assert!(polls.cast_vote(poll.id, poll.options[0].id, voter.id).unwrap());
        // a different option makes no difference, the pair is already used
        assert!(!polls.cast_vote(poll.id, poll.options[1].id, voter.id).unwrap());

        let poll = polls.get_poll(poll.id).unwrap().unwrap();
        assert_eq!(poll.votes.len(), 1);
    }

    #[test]
    fn cast_vote_unknown_user_fails() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let poll = language_poll(&polls, creator.id);

        let err = polls.cast_vote(poll.id, poll.options[0].id, UserId(999)).unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));
    }

    #[test]
    fn cast_vote_unknown_poll_fails() {
        let (identity, polls) = services();
        let voter = user(&identity, "voter", "voter@example.com");

        let err = polls.cast_vote(PollId(999), OptionId(1), voter.id).unwrap_err();
        assert!(matches!(err, ServiceError::PollNotFound));
    }

    #[test]
    fn cast_vote_inactive_poll_fails() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");
        let poll = language_poll(&polls, creator.id);
        assert!(polls.deactivate_poll(poll.id, creator.id).unwrap());

        let err = polls.cast_vote(poll.id, poll.options[0].id, voter.id).unwrap_err();
        assert!(matches!(err, ServiceError::PollInactive));
    }

    #[test]
    fn cast_vote_unknown_option_fails() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");
        let poll = language_poll(&polls, creator.id);

        let err = polls.cast_vote(poll.id, OptionId(999), voter.id).unwrap_err();
        assert!(matches!(err, ServiceError::OptionNotFound));
    }

    #[test]
    fn cast_vote_option_from_another_poll_fails() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");

        let first = polls.create_poll(settings("Poll 1", &["A", "B"]), creator.id).unwrap();
        let second = polls.create_poll(settings("Poll 2", &["X", "Y"]), creator.id).unwrap();

        let err = polls.cast_vote(first.id, second.options[0].id, voter.id).unwrap_err();
        assert!(matches!(err, ServiceError::OptionPollMismatch));
    }

    #[test]
    fn concurrent_double_vote_records_exactly_one() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");
        let poll = language_poll(&polls, creator.id);
        let option = poll.options[0].id;

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = vec![];
        for _ in 0..2 {
            let polls = polls.clone();
            let barrier = barrier.clone();
            let poll_id = poll.id;
            let voter_id = voter.id;
            handles.push(thread::spawn(move || {
                barrier.wait();
                polls.cast_vote(poll_id, option, voter_id).unwrap()
            }));
        }

        let outcomes: Vec<bool> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
        assert_eq!(outcomes.iter().filter(|&&recorded| recorded).count(), 1);

        let poll = polls.get_poll(poll.id).unwrap().unwrap();
        assert_eq!(poll.votes.len(), 1);
    }

    #[test]
    fn results_with_no_votes_are_all_zero() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let poll = language_poll(&polls, creator.id);

        let results = polls.get_poll_results(poll.id).unwrap().unwrap();
        assert_eq!(results.poll_id, poll.id);
        assert_eq!(results.title, "Favorite Programming Language");
        assert_eq!(results.total_votes, 0);
        assert_eq!(results.options.len(), 4);
        for option in &results.options {
            assert_eq!(option.vote_count, 0);
            assert_eq!(option.percentage, 0.0);
        }
    }

    #[test]
    fn results_count_votes_and_round_percentages() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let poll = language_poll(&polls, creator.id);

        let voter1 = user(&identity, "voter1", "voter1@example.com");
        let voter2 = user(&identity, "voter2", "voter2@example.com");
        let voter3 = user(&identity, "voter3", "voter3@example.com");

        let python = option_id(&poll, "Python");
        let javascript = option_id(&poll, "JavaScript");
        assert!(polls.cast_vote(poll.id, python, voter1.id).unwrap());
        assert!(polls.cast_vote(poll.id, python, voter2.id).unwrap());
        assert!(polls.cast_vote(poll.id, javascript, voter3.id).unwrap());

        let results = polls.get_poll_results(poll.id).unwrap().unwrap();
        assert_eq!(results.total_votes, 3);

        let by_text = |text: &str| results.options.iter().find(|option| option.text == text).unwrap();
        assert_eq!(by_text("Python").vote_count, 2);
        assert_eq!(by_text("Python").percentage, 66.67);
        assert_eq!(by_text("JavaScript").vote_count, 1);
        assert_eq!(by_text("JavaScript").percentage, 33.33);
        assert_eq!(by_text("Java").vote_count, 0);
        assert_eq!(by_text("Java").percentage, 0.0);
        assert_eq!(by_text("C++").vote_count, 0);
        assert_eq!(by_text("C++").percentage, 0.0);
    }

    #[test]
    fn results_unknown_poll_is_none() {
        let (_, polls) = services();
        assert!(polls.get_poll_results(PollId(999)).unwrap().is_none());
    }

    #[test]
    fn deactivate_by_creator_sticks() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let poll = language_poll(&polls, creator.id);
        assert!(poll.is_active);

        assert!(polls.deactivate_poll(poll.id, creator.id).unwrap());
        let poll = polls.get_poll(poll.id).unwrap().unwrap();
        assert!(!poll.is_active);
    }

    #[test]
    fn deactivate_by_non_creator_is_refused() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let other = user(&identity, "other", "other@example.com");
        let poll = language_poll(&polls, creator.id);

        assert!(!polls.deactivate_poll(poll.id, other.id).unwrap());
        let poll = polls.get_poll(poll.id).unwrap().unwrap();
        assert!(poll.is_active);
    }

    #[test]
    fn deactivate_unknown_poll_is_refused() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");

        assert!(!polls.deactivate_poll(PollId(999), creator.id).unwrap());
    }

    #[test]
    fn dashboard_summarizes_created_and_voted_polls() {
        let (identity, polls) = services();
        let creator = user(&identity, "creator", "creator@example.com");
        let voter = user(&identity, "voter", "voter@example.com");

        let first = polls.create_poll(settings("First", &["A", "B"]), creator.id).unwrap();
        let second = polls.create_poll(settings("Second", &["X", "Y"]), creator.id).unwrap();
        assert!(polls.cast_vote(first.id, first.options[0].id, voter.id).unwrap());
        assert!(polls.deactivate_poll(second.id, creator.id).unwrap());

        let summary = polls.user_dashboard(creator.id).unwrap();
        assert_eq!(summary.polls_created, 2);
        assert_eq!(summary.active_polls_created, 1);
        assert_eq!(summary.votes_received, 1);
        assert_eq!(summary.polls_voted, 0);
        assert_eq!(summary.open_polls.len(), 1);
        assert_eq!(summary.open_polls[0].title, "First");

        let summary = polls.user_dashboard(voter.id).unwrap();
        assert_eq!(summary.polls_created, 0);
        assert_eq!(summary.votes_received, 0);
        assert_eq!(summary.polls_voted, 1);
        assert!(summary.open_polls.is_empty());
    }

    #[test]
    fn dashboard_unknown_user_fails() {
        let (_, polls) = services();

        let err = polls.user_dashboard(UserId(999)).unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));
    }
}
