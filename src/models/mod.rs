pub mod account;
pub mod library;
pub mod requests;
pub mod transfer;

pub use account::{Account, Profile, TokenResponse};
pub use library::{
    Artist, CreatedPlaylist, NewPlaylist, Playlist, PlaylistItem, PlaylistSummary, SavedTrack,
};
pub use requests::{
    AddAccountRequest, DeleteLibraryRequest, RefreshRequest, RunTransferRequest, TokenRequest,
    TransferArtistsRequest, TransferLikedSongsRequest, TransferPlaylistsRequest,
};
pub use transfer::{
    DeletionStage, DeletionSummary, RunEvent, TransferRun, TransferState, TransferSummary,
};
