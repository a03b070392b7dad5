mod models;
mod poll_api;
mod result_api;
mod user_api;
mod vote_api;

use std::convert::Infallible;
use std::env;
use std::sync::Arc;

use tracing::info;
use warp::Filter;

use crate::service::{IdentityService, PollService};
use crate::store::Store;

fn with_identity(identity: IdentityService) -> impl Filter<Extract = (IdentityService,), Error = Infallible> + Clone {
    warp::any().map(move || identity.clone())
}

fn with_polls(polls: PollService) -> impl Filter<Extract = (PollService,), Error = Infallible> + Clone {
    warp::any().map(move || polls.clone())
}

pub async fn setup(store: Arc<dyn Store>) {
    let identity = IdentityService::new(store.clone());
    let polls = PollService::new(store);

    let login = warp::post()
        .and(warp::path!("api" / "login"))
        .and(warp::body::json())
        .and(with_identity(identity.clone()))
        .map(user_api::login);

    let list_users = warp::get()
        .and(warp::path!("api" / "users"))
        .and(with_identity(identity.clone()))
        .map(user_api::list_users);

    let get_user = warp::get()
        .and(warp::path!("api" / "user" / i32))
        .and(with_identity(identity.clone()))
        .map(user_api::get_user);

    let get_user_by_username = warp::get()
        .and(warp::path!("api" / "user" / "by-username" / String))
        .and(with_identity(identity))
        .map(user_api::get_user_by_username);

    let create_poll = warp::post()
        .and(warp::path!("api" / "polls"))
        .and(warp::body::json())
        .and(with_polls(polls.clone()))
        .map(poll_api::create_poll);

    let list_active_polls = warp::get()
        .and(warp::path!("api" / "polls" / "active"))
        .and(with_polls(polls.clone()))
        .map(poll_api::list_active_polls);

    let list_polls = warp::get()
        .and(warp::path!("api" / "polls"))
        .and(with_polls(polls.clone()))
        .map(poll_api::list_polls);

    let get_poll = warp::get()
        .and(warp::path!("api" / "poll" / i32))
        .and(with_polls(polls.clone()))
        .map(poll_api::get_poll);

    let deactivate_poll = warp::post()
        .and(warp::path!("api" / "poll" / i32 / "deactivate"))
        .and(warp::body::json())
        .and(with_polls(polls.clone()))
        .map(poll_api::deactivate_poll);

    let cast_vote = warp::post()
        .and(warp::path!("api" / "poll" / i32 / "vote"))
        .and(warp::body::json())
        .and(with_polls(polls.clone()))
        .map(vote_api::cast_vote);

    let has_voted = warp::get()
        .and(warp::path!("api" / "poll" / i32 / "voted" / i32))
        .and(with_polls(polls.clone()))
        .map(vote_api::has_voted);

    let results = warp::get()
        .and(warp::path!("api" / "poll" / i32 / "results"))
        .and(with_polls(polls.clone()))
        .map(result_api::get_results);

    let dashboard = warp::get()
        .and(warp::path!("api" / "dashboard" / i32))
        .and(with_polls(polls))
        .map(result_api::dashboard);

    let routes = login
        .or(list_users)
        .or(get_user_by_username)
        .or(get_user)
        .or(create_poll)
        .or(list_active_polls)
        .or(list_polls)
        .or(get_poll)
        .or(deactivate_poll)
        .or(cast_vote)
        .or(has_voted)
        .or(results)
        .or(dashboard);

    let port = env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3000u16);
    info!(port, "serving api");
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}
