use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Where the browser UI lives; OAuth callbacks redirect back here.
    pub client_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    /// Optional JSON file backing the connected-account store.
    pub accounts_file: Option<PathBuf>,
    /// Pause between liked-song batches. `None` when set to 0.
    pub batch_delay: Option<Duration>,
    pub api_base: String,
    pub accounts_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let client_id = required("SPOTIFY_CLIENT_ID")?;
        let client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let redirect_uri = required("SPOTIFY_REDIRECT_URI")?;

        let client_url =
            env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| client_url.clone())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let delay_ms: u64 = env::var("TRANSFER_BATCH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        Ok(Config {
            client_id,
            client_secret,
            redirect_uri,
            client_url,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8888".to_string())
                .parse()
                .unwrap_or(8888),
            cors_origins,
            accounts_file: env::var("ACCOUNTS_FILE").ok().map(PathBuf::from),
            batch_delay: (delay_ms > 0).then(|| Duration::from_millis(delay_ms)),
            api_base: env::var("SPOTIFY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            accounts_base: env::var("SPOTIFY_ACCOUNTS_BASE")
                .unwrap_or_else(|_| DEFAULT_ACCOUNTS_BASE.to_string()),
        })
    }
}

fn required(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).map_err(|_| anyhow::anyhow!("{} environment variable must be set", key))
}

#[cfg(test)]
impl Config {
    /// Configuration pointing nowhere real, for router tests.
    pub fn for_tests() -> Self {
        Config {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://127.0.0.1:8888/auth/callback".to_string(),
            client_url: "http://localhost:3000".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8888,
            cors_origins: vec!["http://localhost:3000".to_string()],
            accounts_file: None,
            batch_delay: None,
            api_base: "http://127.0.0.1:9/v1".to_string(),
            accounts_base: "http://127.0.0.1:9".to_string(),
        }
    }
}
