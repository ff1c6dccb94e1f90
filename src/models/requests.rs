use serde::Deserialize;
use validator::Validate;

use super::Playlist;

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No token provided"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferLikedSongsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No target token provided"))]
    pub target_token: String,
    #[serde(default)]
    pub track_ids: Vec<String>,
    /// Write oldest-first
    #[serde(default)]
    pub reverse: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferPlaylistsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No target token provided"))]
    pub target_token: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "No target user id provided"))]
    pub target_user_id: String,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferArtistsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No target token provided"))]
    pub target_token: String,
    #[serde(default)]
    pub artist_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTransferRequest {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub reverse_liked_order: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLibraryRequest {
    pub account_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No refresh token provided"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddAccountRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No access token provided"))]
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_token_fails_validation() {
        let req: TokenRequest = serde_json::from_value(json!({})).unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("No token provided"));

        let req: TokenRequest = serde_json::from_value(json!({ "token": "abc" })).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_transfer_playlists_requires_target() {
        let req: TransferPlaylistsRequest =
            serde_json::from_value(json!({ "targetToken": "tgt", "playlists": [] })).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("target_user_id"));
        assert!(!errors.field_errors().contains_key("target_token"));
    }

    #[test]
    fn test_refresh_and_add_account_requests() {
        let req: RefreshRequest = serde_json::from_value(json!({ "refresh_token": "" })).unwrap();
        assert!(req.validate().is_err());

        let req: AddAccountRequest =
            serde_json::from_value(json!({ "accessToken": "tok", "refreshToken": "ref" })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.refresh_token.as_deref(), Some("ref"));
    }
}
