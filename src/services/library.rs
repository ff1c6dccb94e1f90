use crate::error::{AppError, Result};
use crate::models::{
    Artist, CreatedPlaylist, NewPlaylist, Playlist, PlaylistItem, PlaylistSummary, Profile,
    SavedTrack,
};
use crate::services::batch::{BatchWriter, ARTISTS_BATCH, LIKED_TRACKS_BATCH, PLAYLIST_TRACKS_BATCH};
use crate::services::pagination::{fetch_all, PageQuery};
use crate::services::spotify::MusicApi;
use futures::future::try_join_all;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const LIKED_TRACKS: &str = "/me/tracks";
const FOLLOWED_ARTISTS: &str = "/me/following?type=artist";

/// Outcome of copying a set of playlists onto a target account.
#[derive(Debug, Clone, Default)]
pub struct PlaylistCopyReport {
    pub created: Vec<CreatedPlaylist>,
    pub skipped: usize,
    pub tracks: usize,
}

/// Typed read, write and delete operations against one vendor account.
#[derive(Clone)]
pub struct LibraryService {
    api: Arc<dyn MusicApi>,
}

/// Append the percent-encoded `ids` list to a relative endpoint.
fn with_ids(endpoint: &str, ids: &[String]) -> Result<String> {
    // Url only parses absolute URLs; the host is dropped again below
    let mut url = Url::parse(&format!("http://vendor{}", endpoint)).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Invalid endpoint {}: {}", endpoint, e))
    })?;
    url.query_pairs_mut().append_pair("ids", &ids.join(","));

    Ok(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::ExternalApi(format!("Unexpected {} payload: {}", what, e)))
}

impl LibraryService {
    pub fn new(api: Arc<dyn MusicApi>) -> Self {
        Self { api }
    }

    pub async fn profile(&self, token: &str) -> Result<Profile> {
        let body = self.api.call(Method::GET, "/me", token, None).await?;
        decode(body, "profile")
    }

    pub async fn liked_tracks(&self, token: &str) -> Result<Vec<SavedTrack>> {
        fetch_all(
            self.api.as_ref(),
            token,
            PageQuery::next_url("/me/tracks?limit=50"),
        )
        .await
    }

    pub async fn playlists(&self, token: &str) -> Result<Vec<PlaylistSummary>> {
        fetch_all(
            self.api.as_ref(),
            token,
            PageQuery::next_url("/me/playlists?limit=50"),
        )
        .await
    }

    pub async fn playlist_tracks(&self, token: &str, playlist_id: &str) -> Result<Vec<PlaylistItem>> {
        fetch_all(
            self.api.as_ref(),
            token,
            PageQuery::next_url(format!("/playlists/{}/tracks?limit=100", playlist_id)),
        )
        .await
    }

    /// Every playlist with its full track list. Track lists are fetched
    /// concurrently; if any one of them fails the whole call fails.
    pub async fn playlists_with_tracks(&self, token: &str) -> Result<Vec<Playlist>> {
        let summaries = self.playlists(token).await?;
        tracing::debug!("Fetching tracks for {} playlists", summaries.len());

        try_join_all(summaries.into_iter().map(|summary| async move {
            let tracks = self.playlist_tracks(token, &summary.id).await?;
            Ok::<_, AppError>(Playlist { summary, tracks })
        }))
        .await
    }

    pub async fn followed_artists(&self, token: &str) -> Result<Vec<Artist>> {
        fetch_all(
            self.api.as_ref(),
            token,
            PageQuery::after_cursor("/me/following?type=artist&limit=50", "artists"),
        )
        .await
    }

    pub async fn save_tracks(
        &self,
        token: &str,
        track_ids: &[String],
        delay: Option<Duration>,
    ) -> Result<usize> {
        let writer = BatchWriter::new(LIKED_TRACKS_BATCH).with_delay(delay);
        self.write_ids(Method::PUT, LIKED_TRACKS, token, track_ids, writer)
            .await
    }

    pub async fn remove_liked_tracks(&self, token: &str, track_ids: &[String]) -> Result<usize> {
        let writer = BatchWriter::new(LIKED_TRACKS_BATCH);
        self.write_ids(Method::DELETE, LIKED_TRACKS, token, track_ids, writer)
            .await
    }

    pub async fn follow_artists(&self, token: &str, artist_ids: &[String]) -> Result<usize> {
        let writer = BatchWriter::new(ARTISTS_BATCH);
        self.write_ids(Method::PUT, FOLLOWED_ARTISTS, token, artist_ids, writer)
            .await
    }

    pub async fn unfollow_artists(&self, token: &str, artist_ids: &[String]) -> Result<usize> {
        let writer = BatchWriter::new(ARTISTS_BATCH);
        self.write_ids(Method::DELETE, FOLLOWED_ARTISTS, token, artist_ids, writer)
            .await
    }

    /// Removing a playlist from a library means unfollowing it.
    pub async fn unfollow_playlist(&self, token: &str, playlist_id: &str) -> Result<()> {
        self.api
            .call(
                Method::DELETE,
                &format!("/playlists/{}/followers", playlist_id),
                token,
                None,
            )
            .await
            .map(|_| ())
    }

    /// Unfollow every playlist in the library. A playlist that fails is
    /// logged and counted instead of aborting. Returns `(removed, failed)`.
    pub async fn remove_playlists(&self, token: &str) -> Result<(usize, usize)> {
        let mut removed = 0;
        let mut failed = 0;

        for playlist in self.playlists(token).await? {
            match self.unfollow_playlist(token, &playlist.id).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!("Failed to remove playlist '{}': {}", playlist.name, e);
                    failed += 1;
                }
            }
        }

        Ok((removed, failed))
    }

    /// Create `playlist` under `user_id` and fill it, 100 items per call.
    /// Returns the new playlist and the number of tracks inserted.
    pub async fn copy_playlist(
        &self,
        token: &str,
        user_id: &str,
        playlist: &Playlist,
    ) -> Result<(CreatedPlaylist, usize)> {
        let body = serde_json::to_value(NewPlaylist {
            name: &playlist.summary.name,
            description: playlist.summary.description.as_deref().unwrap_or(""),
            public: playlist.summary.public.unwrap_or(false),
        })
        .map_err(|e| AppError::Internal(e.into()))?;

        let created: CreatedPlaylist = decode(
            self.api
                .call(
                    Method::POST,
                    &format!("/users/{}/playlists", user_id),
                    token,
                    Some(body),
                )
                .await?,
            "playlist",
        )?;

        let uris = playlist.transferable_uris();
        let dropped = playlist.tracks.len() - uris.len();
        if dropped > 0 {
            tracing::warn!(
                "Dropping {} unavailable or local item(s) from '{}'",
                dropped,
                playlist.summary.name
            );
        }

        let api = self.api.as_ref();
        let endpoint = format!("/playlists/{}/tracks", created.id);
        let added = BatchWriter::new(PLAYLIST_TRACKS_BATCH)
            .write(&uris, |chunk| {
                let endpoint = endpoint.clone();
                let body = json!({ "uris": chunk });
                async move {
                    api.call(Method::POST, &endpoint, token, Some(body))
                        .await
                        .map(|_| ())
                }
            })
            .await?;

        Ok((created, added))
    }

    /// Copy every playlist not curated by the vendor itself, in order.
    pub async fn copy_playlists(
        &self,
        token: &str,
        user_id: &str,
        playlists: &[Playlist],
    ) -> Result<PlaylistCopyReport> {
        let mut report = PlaylistCopyReport::default();

        for playlist in playlists {
            if playlist.summary.is_curated() {
                tracing::debug!("Skipping curated playlist '{}'", playlist.summary.name);
                report.skipped += 1;
                continue;
            }

            let (created, added) = self.copy_playlist(token, user_id, playlist).await?;
            tracing::info!("Copied playlist '{}' ({} tracks)", created.name, added);
            report.tracks += added;
            report.created.push(created);
        }

        Ok(report)
    }

    async fn write_ids(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        ids: &[String],
        writer: BatchWriter,
    ) -> Result<usize> {
        let api = self.api.as_ref();

        writer
            .write(ids, |chunk| {
                let url = with_ids(endpoint, chunk);
                let method = method.clone();
                async move { api.call(method, &url?, token, None).await.map(|_| ()) }
            })
            .await
    }
}
