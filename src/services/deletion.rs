use crate::error::Result;
use crate::models::{Account, DeletionStage, DeletionSummary, RunEvent};
use crate::services::library::LibraryService;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Clears one account's library: liked songs, then playlists, then
/// followed artists.
pub struct DeletionOrchestrator {
    library: LibraryService,
    events: Option<mpsc::Sender<RunEvent<DeletionSummary>>>,
}

impl DeletionOrchestrator {
    pub fn new(library: LibraryService) -> Self {
        Self {
            library,
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::Sender<RunEvent<DeletionSummary>>) -> Self {
        self.events = Some(events);
        self
    }

    /// Playlists that fail to unfollow are counted and skipped; every other
    /// failure aborts the run.
    pub async fn run(&self, run_id: Uuid, account: &Account) -> Result<DeletionSummary> {
        let token = account.access_token.as_str();
        let mut summary = DeletionSummary {
            run_id,
            ..Default::default()
        };

        self.report(run_id, DeletionStage::RemovingLikedSongs, "Removing liked songs...")
            .await;
        let track_ids: Vec<String> = self
            .library
            .liked_tracks(token)
            .await?
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(|track| track.id)
            .collect();
        if !track_ids.is_empty() {
            summary.liked_songs_removed = self.library.remove_liked_tracks(token, &track_ids).await?;
        }

        self.report(run_id, DeletionStage::RemovingPlaylists, "Removing playlists...")
            .await;
        let (removed, failed) = self.library.remove_playlists(token).await?;
        summary.playlists_removed = removed;
        summary.playlists_failed = failed;

        self.report(run_id, DeletionStage::RemovingArtists, "Unfollowing artists...")
            .await;
        let artist_ids: Vec<String> = self
            .library
            .followed_artists(token)
            .await?
            .into_iter()
            .map(|artist| artist.id)
            .collect();
        if !artist_ids.is_empty() {
            summary.artists_unfollowed = self.library.unfollow_artists(token, &artist_ids).await?;
        }

        self.report(run_id, DeletionStage::Complete, "Library cleared").await;
        tracing::info!(
            "Cleared library of {}: {} songs, {} playlists ({} failed), {} artists",
            account.id,
            summary.liked_songs_removed,
            summary.playlists_removed,
            summary.playlists_failed,
            summary.artists_unfollowed
        );

        Ok(summary)
    }

    async fn report(&self, run_id: Uuid, stage: DeletionStage, step: &str) {
        tracing::info!("[{}] {} ({}%)", run_id, step, stage.percentage());
        if let Some(events) = &self.events {
            let _ = events
                .send(RunEvent::Progress {
                    run_id,
                    stage: stage.as_str(),
                    step: step.to_string(),
                    percentage: stage.percentage(),
                })
                .await;
        }
    }
}
