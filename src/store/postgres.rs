use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DbError};

use crate::error::{Conflict, StoreError};
use crate::voting;
use crate::voting::{CreatePollSettings, CreateUser, OptionId, PollId, UserId};
use super::models::{NewOption, NewPoll, NewUser, NewVote, Poll, PollOption, User, Vote};
use super::schema::{options, polls, users, votes};
use super::{IdentityStore, PollStore, VoteStore};

/// PostgreSQL-backed store. Opens a fresh connection per unit of work, which
/// keeps it `Sync` without a pooling layer.
pub struct PgStore {
    database_url: String,
}

impl PgStore {
    pub fn new(database_url: impl Into<String>) -> PgStore {
        PgStore {
            database_url: database_url.into(),
        }
    }

    fn conn(&self) -> Result<PgConnection, StoreError> {
        PgConnection::establish(&self.database_url).map_err(StoreError::Connection)
    }

    fn load_poll(conn: &mut PgConnection, row: Poll) -> Result<voting::Poll, StoreError> {
        let creator = users::table
            .filter(users::id.eq(row.creator_id))
            .select(User::as_select())
            .first(conn)
            .map_err(StoreError::Database)?;
        let poll_options = options::table
            .filter(options::poll_id.eq(row.id))
            .order(options::id.asc())
            .select(PollOption::as_select())
            .load(conn)
            .map_err(StoreError::Database)?;
        let poll_votes = votes::table
            .filter(votes::poll_id.eq(row.id))
            .order(votes::id.asc())
            .select(Vote::as_select())
            .load(conn)
            .map_err(StoreError::Database)?;

        Ok(row.into_poll(creator, poll_options, poll_votes))
    }

    fn load_polls(conn: &mut PgConnection, rows: Vec<Poll>) -> Result<Vec<voting::Poll>, StoreError> {
        rows.into_iter()
            .map(|row| Self::load_poll(conn, row))
            .collect()
    }
}

/// Map a rejected write onto the uniqueness constraint that rejected it.
fn write_error(err: DbError) -> StoreError {
    if let DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) = err {
        let conflict = match info.constraint_name() {
            Some("users_username_key") => Some(Conflict::Username),
            Some("users_email_key") => Some(Conflict::Email),
            Some("votes_user_id_poll_id_key") => Some(Conflict::OneVotePerPoll),
            _ => None,
        };
        if let Some(conflict) = conflict {
            return StoreError::Conflict(conflict);
        }
    }
    StoreError::Database(err)
}

impl IdentityStore for PgStore {
    fn insert_user(&self, user: &CreateUser) -> Result<voting::User, StoreError> {
        let conn = &mut self.conn()?;
        let row: User = diesel::insert_into(users::table)
            .values(&NewUser {
                username: user.username.clone(),
                email: user.email.clone(),
                created_at: Utc::now().naive_utc(),
            })
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(write_error)?;

        Ok(row.into())
    }

    fn get_user(&self, id: UserId) -> Result<Option<voting::User>, StoreError> {
        let conn = &mut self.conn()?;
        let row = users::table
            .filter(users::id.eq(id.0))
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::Database)?;

        Ok(row.map(Into::into))
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<voting::User>, StoreError> {
        let conn = &mut self.conn()?;
        let row = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::Database)?;

        Ok(row.map(Into::into))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<voting::User>, StoreError> {
        let conn = &mut self.conn()?;
        let row = users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::Database)?;

        Ok(row.map(Into::into))
    }

    fn all_users(&self) -> Result<Vec<voting::User>, StoreError> {
        let conn = &mut self.conn()?;
        let rows = users::table
            .order(users::username.asc())
            .select(User::as_select())
            .load(conn)
            .map_err(StoreError::Database)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl PollStore for PgStore {
    fn insert_poll(&self, settings: &CreatePollSettings, creator: UserId) -> Result<voting::Poll, StoreError> {
        let conn = &mut self.conn()?;
        let row = conn
            .transaction::<Poll, DbError, _>(|conn| {
                let poll: Poll = diesel::insert_into(polls::table)
                    .values(&NewPoll {
                        title: settings.title.clone(),
                        description: settings.description.clone(),
                        creator_id: creator.0,
                        is_active: true,
                        created_at: Utc::now().naive_utc(),
                    })
                    .returning(Poll::as_returning())
                    .get_result(conn)?;

                for text in &settings.options {
                    diesel::insert_into(options::table)
                        .values(&NewOption {
                            poll_id: poll.id,
                            text: text.clone(),
                            created_at: Utc::now().naive_utc(),
                        })
                        .execute(conn)?;
                }

                Ok(poll)
            })
            .map_err(StoreError::Database)?;

        Self::load_poll(conn, row)
    }

    fn get_poll(&self, id: PollId) -> Result<Option<voting::Poll>, StoreError> {
        let conn = &mut self.conn()?;
        let row = polls::table
            .filter(polls::id.eq(id.0))
            .select(Poll::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::Database)?;

        match row {
            Some(row) => Self::load_poll(conn, row).map(Some),
            None => Ok(None),
        }
    }

    fn all_polls(&self) -> Result<Vec<voting::Poll>, StoreError> {
        let conn = &mut self.conn()?;
        let rows = polls::table
            .order((polls::created_at.desc(), polls::id.asc()))
            .select(Poll::as_select())
            .load(conn)
            .map_err(StoreError::Database)?;

        Self::load_polls(conn, rows)
    }

    fn active_polls(&self) -> Result<Vec<voting::Poll>, StoreError> {
        let conn = &mut self.conn()?;
        let rows = polls::table
            .filter(polls::is_active.eq(true))
            .order((polls::created_at.desc(), polls::id.asc()))
            .select(Poll::as_select())
            .load(conn)
            .map_err(StoreError::Database)?;

        Self::load_polls(conn, rows)
    }

    fn get_option(&self, id: OptionId) -> Result<Option<voting::PollOption>, StoreError> {
        let conn = &mut self.conn()?;
        let row = options::table
            .filter(options::id.eq(id.0))
            .select(PollOption::as_select())
            .first(conn)
            .optional()
            .map_err(StoreError::Database)?;

        Ok(row.map(Into::into))
    }

    fn set_poll_inactive(&self, id: PollId) -> Result<(), StoreError> {
        let conn = &mut self.conn()?;
        diesel::update(polls::table.filter(polls::id.eq(id.0)))
            .set(polls::is_active.eq(false))
            .execute(conn)
            .map_err(StoreError::Database)?;

        Ok(())
    }
}

impl VoteStore for PgStore {
    fn insert_vote(&self, poll: PollId, option: OptionId, user: UserId) -> Result<voting::Vote, StoreError> {
        let conn = &mut self.conn()?;
        let row: Vote = diesel::insert_into(votes::table)
            .values(&NewVote {
                user_id: user.0,
                poll_id: poll.0,
                option_id: option.0,
                created_at: Utc::now().naive_utc(),
            })
            .returning(Vote::as_returning())
            .get_result(conn)
            .map_err(write_error)?;

        Ok(row.into())
    }

    fn has_user_voted(&self, poll: PollId, user: UserId) -> Result<bool, StoreError> {
        let conn = &mut self.conn()?;
        let count: i64 = votes::table
            .filter(votes::poll_id.eq(poll.0))
            .filter(votes::user_id.eq(user.0))
            .count()
            .get_result(conn)
            .map_err(StoreError::Database)?;

        Ok(count > 0)
    }
}
