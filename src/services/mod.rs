pub mod accounts;
pub mod batch;
pub mod deletion;
pub mod library;
pub mod oauth;
pub mod pagination;
pub mod spotify;
pub mod transfer;

#[cfg(test)]
pub mod testing;

pub use accounts::AccountStore;
pub use deletion::DeletionOrchestrator;
pub use library::LibraryService;
pub use oauth::OAuthGateway;
pub use spotify::{MusicApi, SpotifyClient};
pub use transfer::{TransferOptions, TransferOrchestrator};
