use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A connected vendor account, as the UI keeps it between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Service tier reported by the vendor (`premium`, `free`, ...)
    pub product: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Account {
    pub fn from_profile(
        profile: Profile,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
            email: profile.email,
            product: profile.product,
            access_token,
            refresh_token,
            added_at: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.access_token.trim().is_empty()
    }
}

/// Subset of the vendor's `/me` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub product: Option<String>,
}

/// Token endpoint response (authorization code and refresh grants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
