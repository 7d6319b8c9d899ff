//! Low-level access layer for the Spotify player API
//!
//! This module wraps the three player operations the shuffle protocol is
//! built from. The remote service's queue state lags behind its write
//! acknowledgements, so every call is followed by a fixed settling delay
//! before its result is returned; the reordering engine relies on that
//! pacing and never sleeps itself.

use crate::error::{Result, SpotifyError};
use crate::models::PlayerQueue;
use reqwest::{Client, Method, Response};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Base URL of the Spotify Web API
const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Settling delay applied after every player call
const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);

/// Client for the Spotify player endpoints
pub struct SpotifyApi {
    /// HTTP client
    http: Client,
    /// API base URL (overridable for tests)
    api_base: String,
    /// Fixed delay applied uniformly after each call
    settle: Duration,
}

impl SpotifyApi {
    /// Creates a new client with the default base URL and settling delay
    pub fn new() -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            api_base: API_BASE_URL.to_string(),
            settle: DEFAULT_SETTLE,
        })
    }

    /// Creates a client using the settling delay from configuration
    pub fn from_config(config: &sqconfig::Config) -> Result<Self> {
        Ok(Self::new()?.with_settle_delay(config.get_settle_delay()))
    }

    /// Overrides the API base URL
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Overrides the settling delay
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Returns the configured settling delay
    pub fn settle_delay(&self) -> Duration {
        self.settle
    }

    /// Performs a player request and applies the settling delay
    ///
    /// The delay runs even when the request itself failed: the service's
    /// internal state may still be digesting the attempt.
    async fn player_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
    ) -> Result<Response> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%method, %url, "player request");

        let mut request = self.http.request(method, &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let result = request.send().await;
        sleep(self.settle).await;

        Ok(result?)
    }

    /// Appends a track to the end of the playback queue
    ///
    /// `POST /me/player/queue`. The service acknowledges with 204 No
    /// Content and nothing else counts as success.
    pub async fn add_to_queue(&self, token: &str, uri: &str) -> Result<()> {
        let response = self
            .player_request(Method::POST, "/me/player/queue", &[("uri", uri)], token)
            .await?;

        let status = response.status().as_u16();
        if status != 204 {
            warn!(status, uri, "queue append refused");
            return Err(SpotifyError::Rejected { status });
        }
        Ok(())
    }

    /// Reads the current playback queue
    ///
    /// `GET /me/player/queue`. Returns the parsed snapshot; a non-200
    /// status or an unparseable body is an error.
    pub async fn player_queue(&self, token: &str) -> Result<PlayerQueue> {
        let response = self
            .player_request(Method::GET, "/me/player/queue", &[], token)
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, "queue read refused");
            return Err(SpotifyError::Rejected { status });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|err| {
            warn!(error = %err, "failed to parse queue snapshot");
            SpotifyError::Malformed(err)
        })
    }

    /// Skips playback to the next track
    ///
    /// `POST /me/player/next`. The service answers 204 when a track is
    /// actively playing and 202 when the skip is merely accepted; both
    /// count as success.
    pub async fn skip_to_next(&self, token: &str) -> Result<()> {
        let response = self
            .player_request(Method::POST, "/me/player/next", &[], token)
            .await?;

        let status = response.status().as_u16();
        if status != 204 && status != 202 {
            warn!(status, "skip refused");
            return Err(SpotifyError::Rejected { status });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Instant;

    fn api(server: &mockito::ServerGuard) -> SpotifyApi {
        SpotifyApi::new()
            .unwrap()
            .with_base_url(server.url())
            .with_settle_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_add_to_queue_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/me/player/queue")
            .match_query(Matcher::UrlEncoded(
                "uri".into(),
                "spotify:track:abc".into(),
            ))
            .match_header("authorization", "Bearer token123")
            .with_status(204)
            .create_async()
            .await;

        api(&server)
            .add_to_queue("token123", "spotify:track:abc")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_to_queue_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/player/queue")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = api(&server)
            .add_to_queue("token123", "spotify:track:abc")
            .await
            .unwrap_err();

        assert!(matches!(err, SpotifyError::Rejected { status: 403 }));
    }

    #[tokio::test]
    async fn test_accepted_is_not_success_for_append() {
        // Only 204 acknowledges an append; 202 means something else
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/player/queue")
            .match_query(Matcher::Any)
            .with_status(202)
            .create_async()
            .await;

        let err = api(&server)
            .add_to_queue("token123", "spotify:track:abc")
            .await
            .unwrap_err();

        assert!(matches!(err, SpotifyError::Rejected { status: 202 }));
    }

    #[tokio::test]
    async fn test_player_queue_parses_snapshot() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/player/queue")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"currently_playing": {"uri": "spotify:track:now"},
                    "queue": [{"uri": "spotify:track:a"}, {"uri": "spotify:track:b"}]}"#,
            )
            .create_async()
            .await;

        let queue = api(&server).player_queue("token123").await.unwrap();

        let uris: Vec<&str> = queue.queue.iter().map(|item| item.uri.as_str()).collect();
        assert_eq!(uris, vec!["spotify:track:a", "spotify:track:b"]);
    }

    #[tokio::test]
    async fn test_player_queue_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/player/queue")
            .with_status(401)
            .create_async()
            .await;

        let err = api(&server).player_queue("token123").await.unwrap_err();
        assert!(matches!(err, SpotifyError::Rejected { status: 401 }));
    }

    #[tokio::test]
    async fn test_player_queue_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/me/player/queue")
            .with_status(200)
            .with_body("{not valid json")
            .create_async()
            .await;

        let err = api(&server).player_queue("token123").await.unwrap_err();
        assert!(matches!(err, SpotifyError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_skip_accepts_both_success_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/player/next")
            .with_status(204)
            .create_async()
            .await;

        api(&server).skip_to_next("token123").await.unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/player/next")
            .with_status(202)
            .create_async()
            .await;

        api(&server).skip_to_next("token123").await.unwrap();
    }

    #[tokio::test]
    async fn test_skip_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/player/next")
            .with_status(404)
            .create_async()
            .await;

        let err = api(&server).skip_to_next("token123").await.unwrap_err();
        assert!(matches!(err, SpotifyError::Rejected { status: 404 }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_transport_error() {
        let api = SpotifyApi::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:1")
            .with_settle_delay(Duration::ZERO);

        let err = api.skip_to_next("token123").await.unwrap_err();
        assert!(matches!(err, SpotifyError::Transport(_)));
    }

    #[tokio::test]
    async fn test_settling_delay_is_applied() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/me/player/next")
            .with_status(204)
            .create_async()
            .await;

        let api = SpotifyApi::new()
            .unwrap()
            .with_base_url(server.url())
            .with_settle_delay(Duration::from_millis(50));

        let started = Instant::now();
        api.skip_to_next("token123").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
