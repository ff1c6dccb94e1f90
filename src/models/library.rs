use serde::{Deserialize, Serialize};

/// Owner id the vendor uses for its own curated playlists.
pub const CURATED_OWNER_ID: &str = "spotify";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: Option<String>,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_local: bool,
}

impl TrackRef {
    /// Local files can be listed but never inserted into another account.
    pub fn is_transferable(&self) -> bool {
        !self.is_local && !self.uri.starts_with("spotify:local:")
    }
}

/// One entry of the liked-songs collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTrack {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: Option<TrackRef>,
}

/// One entry of a playlist's track list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    pub owner: Owner,
}

impl PlaylistSummary {
    pub fn is_curated(&self) -> bool {
        self.owner.id == CURATED_OWNER_ID
    }
}

/// A playlist together with its full, ordered track list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(flatten)]
    pub summary: PlaylistSummary,
    #[serde(default)]
    pub tracks: Vec<PlaylistItem>,
}

impl Playlist {
    /// URIs that can be inserted on the target, in playlist order.
    pub fn transferable_uris(&self) -> Vec<String> {
        self.tracks
            .iter()
            .filter_map(|item| item.track.as_ref())
            .filter(|track| track.is_transferable())
            .map(|track| track.uri.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// The vendor's response to playlist creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewPlaylist<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}
