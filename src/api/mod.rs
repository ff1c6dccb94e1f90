pub mod accounts;
pub mod auth;
pub mod transfer;

pub use accounts::account_routes;
pub use auth::auth_routes;
pub use transfer::transfer_routes;

use crate::config::Config;
use crate::services::{AccountStore, LibraryService, MusicApi, OAuthGateway};
use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

/// Everything a request handler may touch. Runs get their own
/// orchestrators; only the account store is shared mutable state.
pub struct AppState {
    pub config: Config,
    pub oauth: OAuthGateway,
    pub accounts: AccountStore,
    pub library: LibraryService,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn MusicApi>, accounts: AccountStore) -> Self {
        Self {
            oauth: OAuthGateway::new(&config),
            library: LibraryService::new(api),
            accounts,
            config,
        }
    }
}

/// Request bodies carry whole playlists with their track lists.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/auth", auth_routes())
        .nest("/transfer", transfer_routes())
        .nest("/accounts", account_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Music transfer API is running" }))
}
