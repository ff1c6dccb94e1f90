use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Idle,
    FetchingProfiles,
    FetchingLikedSongs,
    TransferringLikedSongs,
    FetchingPlaylists,
    TransferringPlaylists,
    FetchingArtists,
    TransferringArtists,
    Complete,
    Errored,
}

impl Default for TransferState {
    fn default() -> Self {
        Self::Idle
    }
}

impl TransferState {
    /// The single state that follows this one on the happy path.
    pub fn successor(self) -> Option<Self> {
        use TransferState::*;
        match self {
            Idle => Some(FetchingProfiles),
            FetchingProfiles => Some(FetchingLikedSongs),
            FetchingLikedSongs => Some(TransferringLikedSongs),
            TransferringLikedSongs => Some(FetchingPlaylists),
            FetchingPlaylists => Some(TransferringPlaylists),
            TransferringPlaylists => Some(FetchingArtists),
            FetchingArtists => Some(TransferringArtists),
            TransferringArtists => Some(Complete),
            Complete | Errored => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Errored)
    }

    pub fn can_enter(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Errored || self.successor() == Some(next)
    }

    pub fn percentage(self) -> u8 {
        use TransferState::*;
        match self {
            Idle | Errored => 0,
            FetchingProfiles => 10,
            FetchingLikedSongs => 20,
            TransferringLikedSongs => 35,
            FetchingPlaylists => 50,
            TransferringPlaylists => 65,
            FetchingArtists => 80,
            TransferringArtists => 90,
            Complete => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        use TransferState::*;
        match self {
            Idle => "idle",
            FetchingProfiles => "fetching_profiles",
            FetchingLikedSongs => "fetching_liked_songs",
            TransferringLikedSongs => "transferring_liked_songs",
            FetchingPlaylists => "fetching_playlists",
            TransferringPlaylists => "transferring_playlists",
            FetchingArtists => "fetching_artists",
            TransferringArtists => "transferring_artists",
            Complete => "complete",
            Errored => "errored",
        }
    }
}

/// Ephemeral state of one transfer; discarded when the run ends.
#[derive(Debug, Clone, Serialize)]
pub struct TransferRun {
    pub run_id: Uuid,
    pub state: TransferState,
    pub step: String,
    pub percentage: u8,
    pub source_id: String,
    pub target_id: String,
}

impl TransferRun {
    pub fn new(source_id: &str, target_id: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: TransferState::Idle,
            step: String::new(),
            percentage: 0,
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
        }
    }

    /// Move to `next`, returning false (and staying put) on an illegal transition.
    pub fn enter(&mut self, next: TransferState, step: impl Into<String>) -> bool {
        if !self.state.can_enter(next) {
            return false;
        }
        self.state = next;
        self.step = step.into();
        if next != TransferState::Errored {
            self.percentage = next.percentage();
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStage {
    RemovingLikedSongs,
    RemovingPlaylists,
    RemovingArtists,
    Complete,
}

impl DeletionStage {
    pub fn percentage(self) -> u8 {
        match self {
            Self::RemovingLikedSongs => 10,
            Self::RemovingPlaylists => 40,
            Self::RemovingArtists => 70,
            Self::Complete => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RemovingLikedSongs => "removing_liked_songs",
            Self::RemovingPlaylists => "removing_playlists",
            Self::RemovingArtists => "removing_artists",
            Self::Complete => "complete",
        }
    }
}

/// Events streamed to the UI while a run is in flight.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum RunEvent<S> {
    #[serde(rename = "progress")]
    Progress {
        run_id: Uuid,
        stage: &'static str,
        step: String,
        percentage: u8,
    },
    #[serde(rename = "completed")]
    Completed { run_id: Uuid, summary: S },
    #[serde(rename = "failed")]
    Failed { run_id: Uuid, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub run_id: Uuid,
    pub liked_songs: usize,
    pub playlists_created: usize,
    pub playlists_skipped: usize,
    pub playlist_tracks: usize,
    pub artists: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSummary {
    pub run_id: Uuid,
    pub liked_songs_removed: usize,
    pub playlists_removed: usize,
    pub playlists_failed: usize,
    pub artists_unfollowed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_strictly_sequential() {
        let mut state = TransferState::Idle;
        let mut visited = vec![state];
        while let Some(next) = state.successor() {
            assert!(state.can_enter(next));
            state = next;
            visited.push(state);
        }
        assert_eq!(visited.len(), 9);
        assert_eq!(state, TransferState::Complete);

        let percentages: Vec<u8> = visited.iter().map(|s| s.percentage()).collect();
        assert!(percentages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_skipping_stages_is_rejected() {
        let mut run = TransferRun::new("a", "b");
        assert!(!run.enter(TransferState::FetchingPlaylists, "skip ahead"));
        assert_eq!(run.state, TransferState::Idle);

        assert!(run.enter(TransferState::FetchingProfiles, "Fetching your profile..."));
        assert_eq!(run.percentage, 10);
        assert!(!run.enter(TransferState::Idle, "back"));
    }

    #[test]
    fn test_errored_absorbs() {
        let mut run = TransferRun::new("a", "b");
        run.enter(TransferState::FetchingProfiles, "profiles");
        run.enter(TransferState::FetchingLikedSongs, "liked");
        assert!(run.enter(TransferState::Errored, "boom"));
        assert_eq!(run.percentage, 20);
        assert!(!run.enter(TransferState::TransferringLikedSongs, "resume"));
        assert!(!run.enter(TransferState::Errored, "again"));
        assert!(!TransferState::Complete.can_enter(TransferState::Errored));
    }

    #[test]
    fn test_event_wire_shape() {
        let run_id = Uuid::new_v4();
        let event: RunEvent<TransferSummary> = RunEvent::Progress {
            run_id,
            stage: TransferState::FetchingPlaylists.as_str(),
            step: "Loading your playlists...".to_string(),
            percentage: 50,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["stage"], "fetching_playlists");
        assert_eq!(json["percentage"], 50);
    }
}
