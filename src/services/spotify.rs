use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

/// Raw access to the vendor's REST API.
///
/// `endpoint` is either a path relative to the API base (`/me/tracks?limit=50`)
/// or an absolute URL handed back by the vendor as a `next` link. Empty
/// response bodies come back as `Value::Null`.
#[async_trait]
pub trait MusicApi: Send + Sync {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        body: Option<Value>,
    ) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    api_base: String,
    client: Client,
}

impl SpotifyClient {
    pub fn new(api_base: String) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.api_base, endpoint)
        }
    }
}

#[async_trait]
impl MusicApi for SpotifyClient {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = self.resolve(endpoint);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!("Spotify API error in {}: {} - {}", endpoint, status, text);
            return Err(AppError::upstream(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            AppError::ExternalApi(format!(
                "Failed to parse response from {}: {} - Response: {}",
                endpoint,
                e,
                text.chars().take(200).collect::<String>()
            ))
        })
    }
}
