//! Error handling for the Spotify client

use thiserror::Error;

/// Result type for sqspotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Failures raised while talking to the Spotify Web API
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a status outside the accepted set
    #[error("Spotify rejected the request (status {status})")]
    Rejected { status: u16 },

    /// A response body could not be parsed into the expected shape
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The accounts service refused the authorization code exchange
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Configuration error (missing credentials, bad redirect URI)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_carries_status() {
        let err = SpotifyError::Rejected { status: 403 };
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: SpotifyError = parse_err.into();
        assert!(matches!(err, SpotifyError::Malformed(_)));
    }
}
