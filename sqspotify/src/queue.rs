//! `QueueService` implementation for the Spotify client
//!
//! This is where the Spotify-specific error taxonomy is normalized into
//! the remote-queue failures the reordering engine understands.

use crate::api::SpotifyApi;
use crate::error::SpotifyError;
use async_trait::async_trait;
use sqshuffle::{QueueService, QueueSnapshot, RemoteQueueError, TrackRef};

impl From<SpotifyError> for RemoteQueueError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Transport(e) => RemoteQueueError::Unreachable(e.to_string()),
            SpotifyError::Rejected { status } => RemoteQueueError::Rejected { status },
            SpotifyError::Malformed(e) => RemoteQueueError::MalformedResponse(e.to_string()),
            // Auth/config failures never originate from the player
            // endpoints, but keep the conversion total
            other => RemoteQueueError::Unreachable(other.to_string()),
        }
    }
}

#[async_trait]
impl QueueService for SpotifyApi {
    async fn append(
        &self,
        credential: &str,
        track: &TrackRef,
    ) -> Result<(), RemoteQueueError> {
        self.add_to_queue(credential, track.as_str())
            .await
            .map_err(RemoteQueueError::from)
    }

    async fn read_queue(&self, credential: &str) -> Result<QueueSnapshot, RemoteQueueError> {
        let queue = self
            .player_queue(credential)
            .await
            .map_err(RemoteQueueError::from)?;

        let tracks = queue
            .queue
            .into_iter()
            .map(|item| TrackRef::new(item.uri))
            .collect();
        Ok(QueueSnapshot::new(tracks))
    }

    async fn skip_next(&self, credential: &str) -> Result<(), RemoteQueueError> {
        self.skip_to_next(credential)
            .await
            .map_err(RemoteQueueError::from)
    }
}
