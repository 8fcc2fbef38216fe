#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed content message, callback URL or stored payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The credential provider failed to sign in, refresh or sign out.
    #[error("Credential provider error: {0}")]
    Provider(String),

    /// The authorization flow finished without a usable credential.
    #[error("Auth flow error: {0}")]
    AuthFlow(String),

    #[cfg(feature = "oauth")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity server answered with a non-success status.
    #[error("OAuth error during {operation} (status {status:?}): {detail}")]
    OAuth {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// Secure store or cookie store failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::Parse(e.to_string())
    }
}
