//! Error types for factfetch.

use std::time::Duration;

use thiserror::Error;

/// Main error type for factfetch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A channel-level failure.
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Invalid configuration given to a builder.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Failure of a single channel invocation.
///
/// These are the only error kinds a channel can surface. The collector
/// catches them at the channel boundary and turns them into `Failure`
/// results, so a broken channel never aborts the rest of a run.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The channel did not produce a response within its bounded interval.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The device rejected the channel's credentials.
    #[error("authentication failed for user '{user}'")]
    AuthFailure { user: String },

    /// Connection, protocol, or non-success HTTP status errors.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The device answered, but the payload does not match the expected shape.
    #[error("unexpected response format: {message}")]
    UnexpectedFormat { message: String },
}

impl ChannelError {
    /// Create a transport error from a bare message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a format error from a bare message.
    pub fn unexpected_format(message: impl Into<String>) -> Self {
        Self::UnexpectedFormat {
            message: message.into(),
        }
    }

    /// Stable label for this error kind, used in rendered reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::AuthFailure { .. } => "auth-failure",
            Self::Transport { .. } => "transport",
            Self::UnexpectedFormat { .. } => "unexpected-format",
        }
    }
}

impl From<russh::Error> for ChannelError {
    fn from(err: russh::Error) -> Self {
        Self::Transport {
            message: "SSH protocol error".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport {
            message: "I/O error".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

// Client-side HTTP timeouts are classified in the REST channel, where
// the configured bound is known; everything else is a transport error.
impl From<reqwest::Error> for ChannelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: "HTTP error".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias using factfetch's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(
            ChannelError::Timeout(Duration::from_secs(5)).kind(),
            "timeout"
        );
        assert_eq!(
            ChannelError::AuthFailure {
                user: "admin".into()
            }
            .kind(),
            "auth-failure"
        );
        assert_eq!(ChannelError::transport("refused").kind(), "transport");
        assert_eq!(
            ChannelError::unexpected_format("missing field").kind(),
            "unexpected-format"
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = ChannelError::AuthFailure {
            user: "admin".into(),
        };
        assert!(err.to_string().contains("admin"));

        let err = ChannelError::Timeout(Duration::from_secs(10));
        assert!(err.to_string().contains("10"));
    }
}
