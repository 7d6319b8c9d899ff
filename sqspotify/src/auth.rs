//! Authorization-code flow against the Spotify accounts service
//!
//! The shuffle engine only borrows a bearer token; producing one is this
//! module's job. The flow is the standard redirect dance: send the user to
//! the accounts authorize page with a state nonce, then trade the returned
//! code for tokens with the application credentials.

use crate::config_ext::SpotifyConfigExt;
use crate::error::{Result, SpotifyError};
use crate::models::TokenResponse;
use anyhow::anyhow;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Base URL of the accounts service
const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// Scopes required to read and reorder the playback queue
const AUTH_SCOPE: &str = "user-read-playback-state user-modify-playback-state";

/// Client for the accounts endpoints
pub struct SpotifyAuth {
    http: Client,
    accounts_base: Url,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl SpotifyAuth {
    /// Creates an auth client for the registered application
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let accounts_base = Url::parse(ACCOUNTS_BASE_URL)
            .map_err(|err| SpotifyError::Config(anyhow!("invalid accounts URL: {err}")))?;

        Ok(Self {
            http,
            accounts_base,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        })
    }

    /// Creates an auth client from the application configuration
    pub fn from_config(config: &sqconfig::Config) -> Result<Self> {
        let (client_id, client_secret) = config.get_spotify_app_credentials()?;
        let redirect_uri = config.get_spotify_redirect_uri()?;
        Self::new(client_id, client_secret, redirect_uri)
    }

    /// Overrides the accounts base URL (tests)
    pub fn with_accounts_base(mut self, base: &str) -> Result<Self> {
        self.accounts_base = Url::parse(base)
            .map_err(|err| SpotifyError::Config(anyhow!("invalid accounts URL: {err}")))?;
        Ok(self)
    }

    /// Returns the redirect URI registered for the application
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Builds the authorize URL the user's browser is sent to
    ///
    /// `state` is the anti-forgery nonce; the caller stores it (cookie)
    /// and checks it against the value echoed back on the redirect.
    pub fn authorize_url(&self, state: &str) -> String {
        let mut url = self.accounts_base.clone();
        url.set_path("/authorize");
        url.query_pairs_mut()
            .clear()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", AUTH_SCOPE)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", state);
        url.to_string()
    }

    /// Exchanges an authorization code for tokens
    ///
    /// `POST /api/token` with the authorization_code grant, authenticated
    /// with the application credentials over HTTP Basic.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let mut url = self.accounts_base.clone();
        url.set_path("/api/token");

        debug!("exchanging authorization code for tokens");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token exchange refused");
            return Err(SpotifyError::TokenExchange(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text).map_err(|err| {
            warn!(error = %err, "failed to parse token response");
            SpotifyError::Malformed(err)
        })?;

        info!("authorization code exchanged");
        Ok(token)
    }
}
