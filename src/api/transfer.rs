use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{
    Artist, CreatedPlaylist, DeleteLibraryRequest, DeletionSummary, Playlist, Profile, RunEvent,
    RunTransferRequest, SavedTrack, TokenRequest, TransferArtistsRequest,
    TransferLikedSongsRequest, TransferPlaylistsRequest, TransferRun, TransferSummary,
};
use crate::services::{DeletionOrchestrator, TransferOptions, TransferOrchestrator};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::{stream::Stream, StreamExt};
use serde::Serialize;
use std::{convert::Infallible, sync::Arc};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;
use validator::Validate;

pub fn transfer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", post(profile))
        .route("/liked-songs", post(liked_songs))
        .route("/playlists", post(playlists))
        .route("/followed-artists", post(followed_artists))
        .route("/transfer-liked-songs", post(transfer_liked_songs))
        .route("/transfer-playlists", post(transfer_playlists))
        .route("/transfer-followed-artists", post(transfer_followed_artists))
        .route("/delete-liked-songs", post(delete_liked_songs))
        .route("/delete-playlists", post(delete_playlists))
        .route("/delete-followed-artists", post(delete_followed_artists))
        .route("/run", post(run_transfer))
        .route("/delete-library", post(delete_library))
}

#[derive(Debug, Serialize)]
struct LikedSongsResponse {
    tracks: Vec<SavedTrack>,
}

#[derive(Debug, Serialize)]
struct PlaylistsResponse {
    playlists: Vec<Playlist>,
}

#[derive(Debug, Serialize)]
struct ArtistsResponse {
    artists: Vec<Artist>,
}

#[derive(Debug, Serialize)]
struct TransferredResponse {
    success: bool,
    transferred: usize,
}

#[derive(Debug, Serialize)]
struct TransferredPlaylistsResponse {
    success: bool,
    playlists: Vec<CreatedPlaylist>,
    skipped: usize,
}

#[derive(Debug, Serialize)]
struct RemovedResponse {
    success: bool,
    removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<usize>,
}

fn validated<T: Validate>(req: T) -> Result<T> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(req)
}

async fn profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<Profile>> {
    let req = validated(req)?;
    Ok(Json(state.library.profile(&req.token).await?))
}

async fn liked_songs(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<LikedSongsResponse>> {
    let req = validated(req)?;
    let tracks = state.library.liked_tracks(&req.token).await?;
    Ok(Json(LikedSongsResponse { tracks }))
}

async fn playlists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<PlaylistsResponse>> {
    let req = validated(req)?;
    let playlists = state.library.playlists_with_tracks(&req.token).await?;
    Ok(Json(PlaylistsResponse { playlists }))
}

async fn followed_artists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<ArtistsResponse>> {
    let req = validated(req)?;
    let artists = state.library.followed_artists(&req.token).await?;
    Ok(Json(ArtistsResponse { artists }))
}

async fn transfer_liked_songs(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferLikedSongsRequest>,
) -> Result<Json<TransferredResponse>> {
    let mut req = validated(req)?;
    if req.reverse {
        req.track_ids.reverse();
    }

    let transferred = state
        .library
        .save_tracks(&req.target_token, &req.track_ids, state.config.batch_delay)
        .await?;
    Ok(Json(TransferredResponse {
        success: true,
        transferred,
    }))
}

async fn transfer_playlists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferPlaylistsRequest>,
) -> Result<Json<TransferredPlaylistsResponse>> {
    let req = validated(req)?;
    let report = state
        .library
        .copy_playlists(&req.target_token, &req.target_user_id, &req.playlists)
        .await?;
    Ok(Json(TransferredPlaylistsResponse {
        success: true,
        playlists: report.created,
        skipped: report.skipped,
    }))
}

async fn transfer_followed_artists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferArtistsRequest>,
) -> Result<Json<TransferredResponse>> {
    let req = validated(req)?;
    let transferred = state
        .library
        .follow_artists(&req.target_token, &req.artist_ids)
        .await?;
    Ok(Json(TransferredResponse {
        success: true,
        transferred,
    }))
}

async fn delete_liked_songs(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<RemovedResponse>> {
    let req = validated(req)?;
    let ids: Vec<String> = state
        .library
        .liked_tracks(&req.token)
        .await?
        .into_iter()
        .filter_map(|item| item.track.and_then(|t| t.id))
        .collect();

    let removed = state.library.remove_liked_tracks(&req.token, &ids).await?;
    Ok(Json(RemovedResponse {
        success: true,
        removed,
        failed: None,
    }))
}

async fn delete_playlists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<RemovedResponse>> {
    let req = validated(req)?;
    let (removed, failed) = state.library.remove_playlists(&req.token).await?;

    Ok(Json(RemovedResponse {
        success: true,
        removed,
        failed: Some(failed),
    }))
}

async fn delete_followed_artists(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<RemovedResponse>> {
    let req = validated(req)?;
    let ids: Vec<String> = state
        .library
        .followed_artists(&req.token)
        .await?
        .into_iter()
        .map(|artist| artist.id)
        .collect();

    let removed = state.library.unfollow_artists(&req.token, &ids).await?;
    Ok(Json(RemovedResponse {
        success: true,
        removed,
        failed: None,
    }))
}

fn event_stream<S>(
    rx: mpsc::Receiver<RunEvent<S>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>
where
    S: Serialize + Send + 'static,
{
    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// SSE endpoint running a full transfer between two connected accounts
async fn run_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunTransferRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (source, target) = state.accounts.pair(&req.source_id, &req.target_id).await?;

    let options = TransferOptions {
        reverse_liked_order: req.reverse_liked_order,
        batch_delay: state.config.batch_delay,
    };

    let (tx, rx) = mpsc::channel::<RunEvent<TransferSummary>>(32);
    let orchestrator =
        TransferOrchestrator::new(state.library.clone(), options).with_events(tx.clone());

    tokio::spawn(async move {
        let mut run = TransferRun::new(&source.id, &target.id);
        let event = match orchestrator.run(&mut run, &source, &target).await {
            Ok(summary) => RunEvent::Completed {
                run_id: run.run_id,
                summary,
            },
            Err(e) => RunEvent::Failed {
                run_id: run.run_id,
                message: e.to_string(),
            },
        };
        let _ = tx.send(event).await;
    });

    Ok(event_stream(rx))
}

/// SSE endpoint clearing the library of one connected account
async fn delete_library(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteLibraryRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let account = state.accounts.get(&req.account_id).await.ok_or_else(|| {
        AppError::Validation(format!("Account {} is not connected", req.account_id))
    })?;

    let (tx, rx) = mpsc::channel::<RunEvent<DeletionSummary>>(32);
    let orchestrator = DeletionOrchestrator::new(state.library.clone()).with_events(tx.clone());

    tokio::spawn(async move {
        let run_id = Uuid::new_v4();
        let event = match orchestrator.run(run_id, &account).await {
            Ok(summary) => RunEvent::Completed { run_id, summary },
            Err(e) => RunEvent::Failed {
                run_id,
                message: e.to_string(),
            },
        };
        let _ = tx.send(event).await;
    });

    Ok(event_stream(rx))
}
