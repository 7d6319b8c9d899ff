//! Response models for the Spotify Web API
//!
//! Only the fields the shuffle flow reads are declared; everything else in
//! the service's (large) payloads is ignored. Fields that may be absent
//! depending on playback state are lenient.

use serde::Deserialize;

/// Player queue snapshot returned by `GET /me/player/queue`
///
/// The `queue` list contains the user's queued tracks followed by
/// auto-play suggestions; the service offers no way to tell the two apart.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerQueue {
    /// The track playing right now, if any
    #[serde(default)]
    pub currently_playing: Option<QueueItem>,
    /// Everything that will play next, auto-play included
    #[serde(default)]
    pub queue: Vec<QueueItem>,
}

/// A single playable item in the queue
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItem {
    /// Spotify URI, e.g. `spotify:track:4uLU6hMCjMI75M1A2tKUQC`
    pub uri: String,
}

/// Token payload returned by the accounts service
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
