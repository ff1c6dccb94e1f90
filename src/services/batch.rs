use crate::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;

/// Vendor ceiling for saving or removing liked tracks in one call.
pub const LIKED_TRACKS_BATCH: usize = 50;
/// Vendor ceiling for following or unfollowing artists in one call.
pub const ARTISTS_BATCH: usize = 50;
/// Vendor ceiling for inserting items into a playlist in one call.
pub const PLAYLIST_TRACKS_BATCH: usize = 100;

/// Splits an ordered sequence into contiguous chunks and writes them one
/// call at a time.
///
/// Writing stops at the first failing chunk. Chunks already written stay
/// written, so a failed run can leave the target partially updated.
#[derive(Debug, Clone, Copy)]
pub struct BatchWriter {
    batch_size: usize,
    delay: Option<Duration>,
}

impl BatchWriter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            delay: None,
        }
    }

    /// Pause between consecutive chunks. The vendor stamps each insert with
    /// its arrival time, so spacing the calls out keeps chunk order visible
    /// on the target.
    pub fn with_delay(mut self, delay: Option<Duration>) -> Self {
        self.delay = delay;
        self
    }

    /// Call `write_chunk` once per chunk, in order. Returns the number of
    /// items written.
    pub async fn write<'a, T, F, Fut>(&self, items: &'a [T], mut write_chunk: F) -> Result<usize>
    where
        F: FnMut(&'a [T]) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if self.batch_size == 0 {
            return Err(AppError::Validation(
                "Batch size must be at least 1".to_string(),
            ));
        }

        let mut written = 0;
        for (index, chunk) in items.chunks(self.batch_size).enumerate() {
            if index > 0 {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
            }

            write_chunk(chunk).await?;
            written += chunk.len();
            tracing::debug!(
                "Wrote batch {} ({} items, {}/{})",
                index + 1,
                chunk.len(),
                written,
                items.len()
            );
        }

        Ok(written)
    }
}
