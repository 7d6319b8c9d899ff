//! Extension integrating Spotify settings into sqconfig
//!
//! This module provides the [`SpotifyConfigExt`] trait, which adds the
//! application credential accessors to `sqconfig::Config`. The client id
//! and secret come from the application registered in the Spotify
//! developer dashboard; the redirect URI must match what is registered
//! there exactly.

use anyhow::{anyhow, Result};
use serde_yaml::Value;
use sqconfig::Config;

/// Extension trait for Spotify application settings
///
/// # Example
///
/// ```rust,ignore
/// use sqconfig::get_config;
/// use sqspotify::SpotifyConfigExt;
///
/// let config = get_config();
/// let (client_id, client_secret) = config.get_spotify_app_credentials()?;
/// ```
pub trait SpotifyConfigExt {
    /// Returns the registered application client id
    fn get_spotify_client_id(&self) -> Result<String>;

    /// Sets the application client id
    fn set_spotify_client_id(&self, client_id: &str) -> Result<()>;

    /// Returns the registered application client secret
    fn get_spotify_client_secret(&self) -> Result<String>;

    /// Sets the application client secret
    fn set_spotify_client_secret(&self, client_secret: &str) -> Result<()>;

    /// Returns the redirect URI registered for the application
    fn get_spotify_redirect_uri(&self) -> Result<String>;

    /// Sets the redirect URI
    fn set_spotify_redirect_uri(&self, redirect_uri: &str) -> Result<()>;

    /// Returns (client_id, client_secret), erroring if either is missing
    fn get_spotify_app_credentials(&self) -> Result<(String, String)>;
}

fn get_non_empty_string(config: &Config, path: &[&str], what: &str) -> Result<String> {
    match config.get_value(path) {
        Ok(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => Err(anyhow!(
            "{} is not configured (set {} in config.yaml or the matching SHUFFLEQ_CONFIG__ variable)",
            what,
            path.join(".")
        )),
    }
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Result<String> {
        get_non_empty_string(self, &["spotify", "client_id"], "Spotify client id")
    }

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()> {
        self.set_value(
            &["spotify", "client_id"],
            Value::String(client_id.to_string()),
        )
    }

    fn get_spotify_client_secret(&self) -> Result<String> {
        get_non_empty_string(self, &["spotify", "client_secret"], "Spotify client secret")
    }

    fn set_spotify_client_secret(&self, client_secret: &str) -> Result<()> {
        self.set_value(
            &["spotify", "client_secret"],
            Value::String(client_secret.to_string()),
        )
    }

    fn get_spotify_redirect_uri(&self) -> Result<String> {
        get_non_empty_string(self, &["spotify", "redirect_uri"], "Spotify redirect URI")
    }

    fn set_spotify_redirect_uri(&self, redirect_uri: &str) -> Result<()> {
        self.set_value(
            &["spotify", "redirect_uri"],
            Value::String(redirect_uri.to_string()),
        )
    }

    fn get_spotify_app_credentials(&self) -> Result<(String, String)> {
        let client_id = self.get_spotify_client_id()?;
        let client_secret = self.get_spotify_client_secret()?;
        Ok((client_id, client_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_credentials_roundtrip() {
        let (_dir, config) = temp_config();
        config.set_spotify_client_id("id123").unwrap();
        config.set_spotify_client_secret("secret456").unwrap();

        let (id, secret) = config.get_spotify_app_credentials().unwrap();
        assert_eq!(id, "id123");
        assert_eq!(secret, "secret456");
    }

    #[test]
    fn test_missing_credentials_error_names_the_key() {
        let (_dir, config) = temp_config();
        let err = config.get_spotify_client_id().unwrap_err();
        assert!(err.to_string().contains("spotify.client_id"));
    }

    #[test]
    fn test_default_redirect_uri_present() {
        let (_dir, config) = temp_config();
        let uri = config.get_spotify_redirect_uri().unwrap();
        assert!(uri.ends_with("/callback"));
    }
}
