//! # sqspotify
//!
//! Spotify Web API client for ShuffleQ.
//!
//! Two collaborators live here:
//!
//! - [`SpotifyApi`]: the rate-conscious wrapper around the three player
//!   primitives the shuffle protocol needs (append to queue, read queue,
//!   skip to next). Every call is followed by a fixed settling delay
//!   because the service's queue visibility lags behind its write
//!   acknowledgements. Implements [`sqshuffle::QueueService`].
//! - [`SpotifyAuth`]: the authorization-code flow against the accounts
//!   service, producing the bearer token the engine borrows.
//!
//! Endpoint shapes are fixed by the Spotify Web API, not chosen here.

pub mod api;
pub mod auth;
pub mod config_ext;
pub mod error;
pub mod models;
mod queue;

pub use api::SpotifyApi;
pub use auth::SpotifyAuth;
pub use config_ext::SpotifyConfigExt;
pub use error::{Result, SpotifyError};
pub use models::{PlayerQueue, QueueItem, TokenResponse};
