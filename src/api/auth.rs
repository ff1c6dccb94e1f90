use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{RefreshRequest, TokenResponse};
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Redirect back to the UI with `params` in the query string.
fn to_client(client_url: &str, params: &[(&str, &str)]) -> Redirect {
    match Url::parse_with_params(client_url, params) {
        Ok(url) => Redirect::to(url.as_str()),
        Err(e) => {
            tracing::error!("CLIENT_URL {} is not a valid URL: {}", client_url, e);
            Redirect::to(client_url)
        }
    }
}

async fn login(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let url = state.oauth.begin().await?;
    Ok(Redirect::to(&url))
}

async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let client_url = state.config.client_url.as_str();

    let known_state = match &params.state {
        Some(s) => state.oauth.take_state(s).await,
        None => false,
    };
    if !known_state {
        tracing::warn!("OAuth callback with missing or unknown state");
        return to_client(client_url, &[("error", "state_mismatch")]);
    }

    if let Some(error) = &params.error {
        tracing::warn!("Authorization denied: {}", error);
        return to_client(client_url, &[("error", error.as_str())]);
    }

    let Some(code) = params.code.as_deref() else {
        return to_client(client_url, &[("error", "invalid_token")]);
    };

    match state.oauth.exchange_code(code).await {
        Ok(token) => to_client(
            client_url,
            &[
                ("access_token", token.access_token.as_str()),
                ("refresh_token", token.refresh_token.as_deref().unwrap_or("")),
            ],
        ),
        Err(e) => {
            tracing::error!("Error during authentication: {}", e);
            to_client(client_url, &[("error", "invalid_token")])
        }
    }
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let token = state.oauth.refresh(&req.refresh_token).await.map_err(|e| {
        tracing::error!("Error refreshing token: {}", e);
        AppError::Validation("Failed to refresh token".to_string())
    })?;
    Ok(Json(token))
}
