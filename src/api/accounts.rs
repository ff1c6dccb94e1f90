use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{Account, AddAccountRequest};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_accounts).post(add_account))
        .route("/:id", delete(remove_account))
        .route("/:id/refresh", post(refresh_account))
}

async fn list_accounts(State(state): State<Arc<AppState>>) -> Json<Vec<Account>> {
    Json(state.accounts.list().await)
}

/// Look up who owns the freshly issued token and remember the account.
async fn add_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddAccountRequest>,
) -> Result<Json<Account>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = state.library.profile(&req.access_token).await?;
    let account = Account::from_profile(profile, req.access_token, req.refresh_token);
    state.accounts.add(account.clone()).await?;

    Ok(Json(account))
}

async fn remove_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.accounts.remove(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Account {} is not connected", id)))
    }
}

async fn refresh_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>> {
    let account = state
        .accounts
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Account {} is not connected", id)))?;
    let refresh_token = account.refresh_token.ok_or_else(|| {
        AppError::Validation(format!("Account {} has no refresh token", id))
    })?;

    let token = state.oauth.refresh(&refresh_token).await?;
    let updated = state
        .accounts
        .update_tokens(&id, token.access_token, token.refresh_token)
        .await?;

    Ok(Json(updated))
}
