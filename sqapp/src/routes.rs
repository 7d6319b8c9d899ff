//! HTTP routes for the shuffle service
//!
//! The surface is small: two pages, the three-step authorization dance,
//! and the shuffle trigger. The calling convention for `POST /shuffle` is
//! 204 when the operation completed (including the nothing-to-shuffle
//! case) and 500 on any terminal failure, with the specifics kept in the
//! server log rather than the response body.

use crate::{cookies, pages};
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_embed::ServeEmbed;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use sqshuffle::{ShuffleEngine, TrackRef};
use sqspotify::{SpotifyApi, SpotifyAuth};
use std::sync::Arc;
use tracing::{error, info, warn};

const ACCESS_TOKEN_COOKIE: &str = "access_token";
const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
const STATE_COOKIE: &str = "spotify_auth_state";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<SpotifyApi>,
    pub auth: Arc<SpotifyAuth>,
    pub sentinel: TrackRef,
    pub poll_attempts: usize,
}

/// Builds the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/authenticate", get(authenticate))
        .route("/callback", get(callback))
        .route("/shuffle", post(shuffle))
        .nest_service("/static", ServeEmbed::<pages::WebAssets>::new())
        .with_state(state)
}

async fn home(headers: HeaderMap) -> Response {
    if cookies::get(&headers, ACCESS_TOKEN_COOKIE).is_none() {
        return Redirect::to("/login").into_response();
    }
    pages::page("home.html")
}

async fn login() -> Response {
    pages::page("login.html")
}

/// Starts the authorization dance: remember a state nonce in a cookie and
/// send the browser to the accounts authorize page.
async fn authenticate(State(state): State<AppState>) -> Response {
    let nonce = random_state(16);
    let url = state.auth.authorize_url(&nonce);

    (
        AppendHeaders([(SET_COOKIE, cookies::set(STATE_COOKIE, &nonce))]),
        Redirect::to(&url),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Completes the authorization dance: check the echoed state against the
/// cookie, trade the code for tokens, store them as session cookies.
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Response {
    if let Some(err) = params.error {
        warn!(error = %err, "authorization refused by the accounts service");
        return (StatusCode::BAD_REQUEST, err).into_response();
    }

    let Some(stored) = cookies::get(&headers, STATE_COOKIE) else {
        return (StatusCode::BAD_REQUEST, "Missing state cookie").into_response();
    };

    let echoed = params.state.unwrap_or_default();
    if echoed.is_empty() || echoed != stored {
        return (StatusCode::BAD_REQUEST, "Invalid state").into_response();
    }

    let Some(code) = params.code else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code").into_response();
    };

    match state.auth.exchange_code(&code).await {
        Ok(token) => {
            // The state nonce is single-use
            let mut set_cookies = vec![(SET_COOKIE, cookies::clear(STATE_COOKIE))];

            if !token.access_token.is_empty() {
                set_cookies.push((
                    SET_COOKIE,
                    cookies::set(ACCESS_TOKEN_COOKIE, &token.access_token),
                ));
                if let Some(refresh) = &token.refresh_token {
                    set_cookies.push((SET_COOKIE, cookies::set(REFRESH_TOKEN_COOKIE, refresh)));
                }
            }

            (AppendHeaders(set_cookies), Redirect::to("/")).into_response()
        }
        Err(err) => {
            error!(error = %err, "token exchange failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Runs one shuffle operation for the calling session.
///
/// At most one operation may be in flight per credential: two interleaved
/// runs corrupt each other's sentinel accounting. The page triggers this
/// endpoint synchronously, which is the only guard the deployment needs.
/// A client that gives up and retries must assume the queue was already
/// disturbed: the outcome of an abandoned request is unknown, not undone.
async fn shuffle(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = cookies::get(&headers, ACCESS_TOKEN_COOKIE) else {
        return Redirect::to("/login").into_response();
    };

    let mut engine = ShuffleEngine::new(state.api.clone(), state.sentinel.clone())
        .with_poll_attempts(state.poll_attempts);

    match engine.shuffle_queue(&token).await {
        Ok(outcome) => {
            info!(?outcome, "shuffle complete");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            error!(error = %err, "shuffle failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Random alphanumeric nonce for the OAuth state parameter
fn random_state(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_state_shape() {
        let state = random_state(16);
        assert_eq!(state.len(), 16);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_states_differ() {
        assert_ne!(random_state(16), random_state(16));
    }
}
