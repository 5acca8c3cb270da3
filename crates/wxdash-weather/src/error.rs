use thiserror::Error;

/// Failures of the fetch layer. Derivation itself never fails.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing expected field: {0}")]
    MissingField(String),

    #[error("Source error: {0}")]
    Source(String),
}

impl WeatherError {
    /// True when a retry on the next cycle might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            WeatherError::Io(_) => true,
            _ => false,
        }
    }
}
