mod error;
mod service;
mod store;
mod voting;
mod web;

use std::env;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use store::memory::MemoryStore;
use store::postgres::PgStore;
use store::Store;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pollboard=info")))
        .init();

    let store: Arc<dyn Store> = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            info!("using postgres store");
            Arc::new(PgStore::new(database_url))
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    web::setup(store).await;
}
