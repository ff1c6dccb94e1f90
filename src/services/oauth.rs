use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::TokenResponse;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Permissions needed to read a library and write one back.
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-library-read",
    "user-library-modify",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-public",
    "playlist-modify-private",
    "user-follow-read",
    "user-follow-modify",
    "user-top-read",
];

const STATE_LENGTH: usize = 16;
/// How long a login may sit on the vendor's consent page.
const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Authorization-code flow against the vendor's accounts service.
pub struct OAuthGateway {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_base: String,
    pending_states: Mutex<HashMap<String, Instant>>,
    state_ttl: Duration,
    client: Client,
}

impl OAuthGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            accounts_base: config.accounts_base.trim_end_matches('/').to_string(),
            pending_states: Mutex::new(HashMap::new()),
            state_ttl: STATE_TTL,
            client: Client::new(),
        }
    }

    #[cfg(test)]
    fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    fn generate_state() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Start a login: remember a fresh state and build the authorize URL.
    pub async fn begin(&self) -> Result<String> {
        let state = Self::generate_state();
        let url = self.authorize_url(&state)?;
        let mut pending = self.pending_states.lock().await;
        pending.retain(|_, issued| issued.elapsed() < self.state_ttl);
        pending.insert(state, Instant::now());
        Ok(url)
    }

    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_base),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("scope", scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid authorize URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Consume a state issued by [`begin`](Self::begin). Unknown, expired or
    /// replayed states return false.
    pub async fn take_state(&self, state: &str) -> bool {
        match self.pending_states.lock().await.remove(state) {
            Some(issued) => issued.elapsed() < self.state_ttl,
            None => false,
        }
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let mut token = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        // The vendor doesn't always rotate the refresh token
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        Ok(token)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token endpoint error: {} - {}", status, body);
            return Err(AppError::upstream(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse token response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_all_params() {
        let gateway = OAuthGateway::new(&Config::for_tests());
        let url = Url::parse(&gateway.authorize_url("abc123").unwrap()).unwrap();

        assert_eq!(url.path(), "/authorize");
        let params: std::collections::HashMap<String, String> =
            url.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "test-client");
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:8888/auth/callback");
        assert_eq!(params["state"], "abc123");

        let scopes: Vec<&str> = params["scope"].split(' ').collect();
        assert_eq!(scopes, SCOPES);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let gateway = OAuthGateway::new(&Config::for_tests());
        let url = Url::parse(&gateway.begin().await.unwrap()).unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        assert_eq!(state.len(), STATE_LENGTH);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!gateway.take_state("forged").await);
        assert!(gateway.take_state(&state).await);
        assert!(!gateway.take_state(&state).await);
    }

    fn issued_state(url: &str) -> String {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let gateway = OAuthGateway::new(&Config::for_tests()).with_state_ttl(Duration::ZERO);
        let state = issued_state(&gateway.begin().await.unwrap());

        assert!(!gateway.take_state(&state).await);
    }

    #[tokio::test]
    async fn test_abandoned_logins_are_pruned() {
        let gateway = OAuthGateway::new(&Config::for_tests()).with_state_ttl(Duration::ZERO);
        for _ in 0..100 {
            gateway.begin().await.unwrap();
        }
        assert_eq!(gateway.pending_states.lock().await.len(), 1);

        let gateway = OAuthGateway::new(&Config::for_tests());
        for _ in 0..5 {
            gateway.begin().await.unwrap();
        }
        assert_eq!(gateway.pending_states.lock().await.len(), 5);
    }
}
