use thiserror::Error;

/// Failure talking to the careers API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("careers API returned status {0}")]
    Status(u16),

    #[error("careers API timed out")]
    Timeout,

    #[error("careers API unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid response from careers API: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// HTTP status to report to the caller.
    pub fn status(&self) -> u16 {
        match self {
            UpstreamError::Status(status) => *status,
            UpstreamError::Timeout => 504,
            UpstreamError::Transport(_) | UpstreamError::InvalidResponse(_) => 502,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_decode() {
            UpstreamError::InvalidResponse(e.to_string())
        } else {
            UpstreamError::Transport(e)
        }
    }
}
