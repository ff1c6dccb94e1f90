use crate::error::{AppError, Result};
use crate::models::{Account, RunEvent, TransferRun, TransferState, TransferSummary};
use crate::services::library::LibraryService;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferOptions {
    /// Write liked songs oldest-first, so the target's own "date added"
    /// ordering ends up matching the source.
    pub reverse_liked_order: bool,
    pub batch_delay: Option<Duration>,
}

/// Copies liked songs, playlists and followed artists from one account to
/// another, one stage at a time.
///
/// Nothing is deduplicated: running the same transfer twice saves the same
/// songs and follows twice and creates every playlist again.
pub struct TransferOrchestrator {
    library: LibraryService,
    options: TransferOptions,
    events: Option<mpsc::Sender<RunEvent<TransferSummary>>>,
}

impl TransferOrchestrator {
    pub fn new(library: LibraryService, options: TransferOptions) -> Self {
        Self {
            library,
            options,
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::Sender<RunEvent<TransferSummary>>) -> Self {
        self.events = Some(events);
        self
    }

    /// Drive `run` from `Idle` to `Complete`. On failure the run is left in
    /// `Errored` and the error is returned; anything already written to the
    /// target stays there.
    pub async fn run(
        &self,
        run: &mut TransferRun,
        source: &Account,
        target: &Account,
    ) -> Result<TransferSummary> {
        check_accounts(source, target)?;

        match self.execute(run, source, target).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::error!(
                    "Transfer {} failed during {}: {}",
                    run.run_id,
                    run.state.as_str(),
                    e
                );
                run.enter(TransferState::Errored, e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        run: &mut TransferRun,
        source: &Account,
        target: &Account,
    ) -> Result<TransferSummary> {
        let source_token = source.access_token.as_str();
        let target_token = target.access_token.as_str();
        let mut summary = TransferSummary {
            run_id: run.run_id,
            ..Default::default()
        };

        self.advance(run, TransferState::FetchingProfiles, "Fetching your profile...")
            .await?;
        self.library.profile(source_token).await?;
        let target_profile = self.library.profile(target_token).await?;

        // Liked songs
        self.advance(run, TransferState::FetchingLikedSongs, "Loading your liked songs...")
            .await?;
        let mut track_ids: Vec<String> = self
            .library
            .liked_tracks(source_token)
            .await?
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(|track| track.id)
            .collect();
        if self.options.reverse_liked_order {
            track_ids.reverse();
        }

        self.advance(
            run,
            TransferState::TransferringLikedSongs,
            format!("Transferring {} liked songs...", track_ids.len()),
        )
        .await?;
        if !track_ids.is_empty() {
            summary.liked_songs = self
                .library
                .save_tracks(target_token, &track_ids, self.options.batch_delay)
                .await?;
        }

        // Playlists
        self.advance(run, TransferState::FetchingPlaylists, "Loading your playlists...")
            .await?;
        let playlists = self.library.playlists_with_tracks(source_token).await?;

        self.advance(
            run,
            TransferState::TransferringPlaylists,
            format!("Transferring {} playlists...", playlists.len()),
        )
        .await?;
        if !playlists.is_empty() {
            let report = self
                .library
                .copy_playlists(target_token, &target_profile.id, &playlists)
                .await?;
            summary.playlists_created = report.created.len();
            summary.playlists_skipped = report.skipped;
            summary.playlist_tracks = report.tracks;
        }

        // Followed artists
        self.advance(run, TransferState::FetchingArtists, "Loading followed artists...")
            .await?;
        let artist_ids: Vec<String> = self
            .library
            .followed_artists(source_token)
            .await?
            .into_iter()
            .map(|artist| artist.id)
            .collect();

        self.advance(
            run,
            TransferState::TransferringArtists,
            format!("Transferring {} followed artists...", artist_ids.len()),
        )
        .await?;
        if !artist_ids.is_empty() {
            summary.artists = self.library.follow_artists(target_token, &artist_ids).await?;
        }

        self.advance(run, TransferState::Complete, "Transfer complete!")
            .await?;

        Ok(summary)
    }

    async fn advance(
        &self,
        run: &mut TransferRun,
        next: TransferState,
        step: impl Into<String>,
    ) -> Result<()> {
        let from = run.state;
        if !run.enter(next, step) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Illegal transfer transition {} -> {}",
                from.as_str(),
                next.as_str()
            )));
        }

        tracing::info!("[{}] {} ({}%)", run.run_id, run.step, run.percentage);

        if let Some(events) = &self.events {
            // A disconnected listener doesn't stop the run
            let _ = events
                .send(RunEvent::Progress {
                    run_id: run.run_id,
                    stage: next.as_str(),
                    step: run.step.clone(),
                    percentage: run.percentage,
                })
                .await;
        }

        Ok(())
    }
}

fn check_accounts(source: &Account, target: &Account) -> Result<()> {
    if source.id == target.id {
        return Err(AppError::Validation(
            "Source and target accounts must be different".to_string(),
        ));
    }
    if !source.is_authenticated() || !target.is_authenticated() {
        return Err(AppError::Validation(
            "Both accounts must be connected before transferring".to_string(),
        ));
    }
    Ok(())
}
