//! Diesel row models and their conversions into domain values. Rows carry
//! `NaiveDateTime` straight from the `Timestamp` columns; the conversions
//! re-attach UTC.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::voting;
use crate::voting::{OptionId, PollId, UserId, VoteId};
use super::schema;

#[derive(Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl Into<voting::User> for User {
    fn into(self) -> voting::User {
        voting::User {
            id: UserId(self.id),
            username: self.username,
            email: self.email,
            created_at: self.created_at.and_utc(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Associations, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::polls)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(User, foreign_key = creator_id))]
pub struct Poll {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub creator_id: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Poll {
    /// Assemble the disconnected aggregate from its already-loaded parts.
    pub fn into_poll(self, creator: User, options: Vec<PollOption>, votes: Vec<Vote>) -> voting::Poll {
        voting::Poll {
            id: PollId(self.id),
            title: self.title,
            description: self.description,
            creator: creator.into(),
            options: options.into_iter().map(Into::into).collect(),
            votes: votes.into_iter().map(Into::into).collect(),
            is_active: self.is_active,
            created_at: self.created_at.and_utc(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::polls)]
pub struct NewPoll {
    pub title: String,
    pub description: String,
    pub creator_id: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Associations, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::options)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(Poll, foreign_key = poll_id))]
pub struct PollOption {
    pub id: i32,
    pub poll_id: i32,
    pub text: String,
    pub created_at: NaiveDateTime,
}

impl Into<voting::PollOption> for PollOption {
    fn into(self) -> voting::PollOption {
        voting::PollOption {
            id: OptionId(self.id),
            poll_id: PollId(self.poll_id),
            text: self.text,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::options)]
pub struct NewOption {
    pub poll_id: i32,
    pub text: String,
    pub created_at: NaiveDateTime,
}

#[derive(Associations, Identifiable, Queryable, Selectable)]
#[diesel(table_name = schema::votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(belongs_to(Poll, foreign_key = poll_id))]
pub struct Vote {
    pub id: i32,
    pub user_id: i32,
    pub poll_id: i32,
    pub option_id: i32,
    pub created_at: NaiveDateTime,
}

impl Into<voting::Vote> for Vote {
    fn into(self) -> voting::Vote {
        voting::Vote {
            id: VoteId(self.id),
            user_id: UserId(self.user_id),
            poll_id: PollId(self.poll_id),
            option_id: OptionId(self.option_id),
            created_at: self.created_at.and_utc(),
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::votes)]
pub struct NewVote {
    pub user_id: i32,
    pub poll_id: i32,
    pub option_id: i32,
    pub created_at: NaiveDateTime,
}
