//! # sqshuffle
//!
//! Core types and reordering engine for the ShuffleQ queue shuffler.
//!
//! The remote playback service only offers three queue primitives: append a
//! track to the end of the queue, read a snapshot of the queue, and skip to
//! the next track. There is no reorder and no delete. This crate turns those
//! primitives into an effective shuffle:
//!
//! - [`QueueService`]: the seam implemented by remote service clients
//!   (`sqspotify` provides the Spotify implementation).
//! - [`QueueSnapshot`]: a queue snapshot with sentinel-based prefix
//!   extraction, separating the user's queue from auto-play filler.
//! - [`engine::ShuffleEngine`]: the sentinel/poll/permute/requeue/skip
//!   protocol itself.
//! - [`shuffler::QueueShuffler`]: an injectable, seedable permutation
//!   source so tests can be deterministic.
//!
//! Remote failures cross the seam as [`RemoteQueueError`], keeping this
//! crate free of any HTTP dependency.

pub mod engine;
pub mod error;
pub mod shuffler;

pub use engine::{ShuffleEngine, ShuffleOutcome};
pub use error::{Result, ShuffleError};
pub use shuffler::{QueueShuffler, RandomShuffler};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a playable item, as defined by the remote service.
///
/// Equality is exact identifier match; nothing else is assumed about the
/// contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackRef(String);

impl TrackRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

impl From<String> for TrackRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// Ordered queue state as reported by the remote service.
///
/// The service reports everything that will play next, which includes
/// auto-play suggestions beyond the user's actual queue. Only the prefix
/// strictly before the sentinel belongs to the user; the rest must be
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    tracks: Vec<TrackRef>,
}

impl QueueSnapshot {
    pub fn new(tracks: Vec<TrackRef>) -> Self {
        Self { tracks }
    }

    /// All reported tracks, auto-play content included.
    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Extracts the user's queue: the prefix strictly before the first
    /// occurrence of `sentinel`.
    ///
    /// Returns `None` when the sentinel is not present in the snapshot, in
    /// which case nothing in the snapshot can be attributed to the user.
    pub fn prefix_before(&self, sentinel: &TrackRef) -> Option<Vec<TrackRef>> {
        let position = self.tracks.iter().position(|track| track == sentinel)?;
        Some(self.tracks[..position].to_vec())
    }
}

/// Normalized failures reported by a [`QueueService`] implementation.
///
/// String payloads keep this crate independent of any HTTP client; the
/// implementing crate maps its transport errors into these variants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteQueueError {
    /// Transport-level failure, the remote service could not be reached.
    #[error("remote service unreachable: {0}")]
    Unreachable(String),

    /// The remote service answered with a non-success status.
    #[error("remote service rejected the request (status {status})")]
    Rejected { status: u16 },

    /// The snapshot body could not be parsed into the expected shape.
    #[error("malformed queue snapshot: {0}")]
    MalformedResponse(String),
}

/// The three primitives the remote playback service exposes.
///
/// Implementations authenticate each call with the borrowed bearer
/// `credential` and are expected to apply their own settling delay before
/// returning, because the remote service's queue visibility lags behind its
/// write acknowledgements. The engine relies on that pacing and never
/// sleeps itself.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Appends a track to the end of the remote queue.
    async fn append(
        &self,
        credential: &str,
        track: &TrackRef,
    ) -> std::result::Result<(), RemoteQueueError>;

    /// Reads the current queue snapshot.
    async fn read_queue(
        &self,
        credential: &str,
    ) -> std::result::Result<QueueSnapshot, RemoteQueueError>;

    /// Skips playback to the next track.
    async fn skip_next(&self, credential: &str) -> std::result::Result<(), RemoteQueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(reference: &str) -> TrackRef {
        TrackRef::from(reference)
    }

    #[test]
    fn test_prefix_before_sentinel() {
        let sentinel = track("spotify:track:sentinel");
        let snapshot = QueueSnapshot::new(vec![
            track("spotify:track:a"),
            track("spotify:track:b"),
            sentinel.clone(),
            track("spotify:track:autoplay1"),
            track("spotify:track:autoplay2"),
        ]);

        let prefix = snapshot.prefix_before(&sentinel).unwrap();
        assert_eq!(prefix, vec![track("spotify:track:a"), track("spotify:track:b")]);
    }

    #[test]
    fn test_prefix_missing_sentinel() {
        let sentinel = track("spotify:track:sentinel");
        let snapshot = QueueSnapshot::new(vec![track("spotify:track:a")]);
        assert!(snapshot.prefix_before(&sentinel).is_none());
    }

    #[test]
    fn test_prefix_sentinel_first() {
        let sentinel = track("spotify:track:sentinel");
        let snapshot = QueueSnapshot::new(vec![sentinel.clone(), track("spotify:track:autoplay")]);
        let prefix = snapshot.prefix_before(&sentinel).unwrap();
        assert!(prefix.is_empty());
    }

    #[test]
    fn test_prefix_stops_at_first_occurrence() {
        let sentinel = track("spotify:track:sentinel");
        let snapshot = QueueSnapshot::new(vec![
            track("spotify:track:a"),
            sentinel.clone(),
            track("spotify:track:b"),
            sentinel.clone(),
        ]);
        let prefix = snapshot.prefix_before(&sentinel).unwrap();
        assert_eq!(prefix, vec![track("spotify:track:a")]);
    }

    #[test]
    fn test_track_ref_equality_is_exact() {
        assert_eq!(track("spotify:track:a"), track("spotify:track:a"));
        assert_ne!(track("spotify:track:a"), track("spotify:track:A"));
    }
}
