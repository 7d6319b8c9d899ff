//! ShuffleQ server binary
//!
//! Wires the configuration, the Spotify clients and the HTTP routes
//! together, then serves until Ctrl+C.

mod cookies;
mod pages;
mod routes;

use anyhow::Context;
use routes::AppState;
use sqconfig::get_config;
use sqshuffle::TrackRef;
use sqspotify::{SpotifyApi, SpotifyAuth};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = get_config();

    let api = Arc::new(SpotifyApi::from_config(&config).context("creating Spotify client")?);
    let auth = Arc::new(SpotifyAuth::from_config(&config).context(
        "creating Spotify auth client (are the application credentials configured?)",
    )?);

    let state = AppState {
        api,
        auth,
        sentinel: TrackRef::new(config.get_sentinel_uri()),
        poll_attempts: config.get_poll_attempts(),
    };

    let router = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.get_http_port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding HTTP listener")?;

    info!("🎵 ShuffleQ running at {}", config.get_base_url());

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.expect("failed to listen for ctrl_c");
            info!("Ctrl+C received, shutting down");
        })
        .await
        .context("serving HTTP")?;

    Ok(())
}
