use thiserror::Error;

/// Every failure the chat transport can report to its caller.
///
/// The `Display` output is what ends up in the visible error turn, so the
/// messages are kept short and human readable.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("{0}")]
    VerificationUnavailable(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    StreamProtocol(String),

    /// A single frame that could not be parsed. Recovered locally, never surfaced.
    #[error("Failed to parse stream frame: {0}")]
    FrameDecode(String),

    #[error("Event delivered after the stream already terminated")]
    LateDelivery,

    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Errors raised while loading [`crate::config::Settings`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_passed_through() {
        let err = ChatError::VerificationUnavailable("Turnstile not initialized".to_string());
        assert_eq!(err.to_string(), "Turnstile not initialized");

        let err = ChatError::StreamProtocol("limit exceeded".to_string());
        assert_eq!(err.to_string(), "limit exceeded");
    }
}
