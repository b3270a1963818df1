use thiserror::Error;

/// Errors from the YouTube player client.
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("video is not playable ({status}): {reason}")]
    Unplayable { status: String, reason: String },

    #[error("no supported stream format for this video")]
    NoSupportedStream,

    #[error("parse error: {0}")]
    Parse(String),
}
