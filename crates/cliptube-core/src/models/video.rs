use serde::{Deserialize, Serialize};

use crate::error::CliptubeError;

/// Prefix of the canonical watch URL; completed by appending the video id.
pub const CANONICAL_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Length of a YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;

/// Canonical YouTube video identifier (exactly 11 of `[A-Za-z0-9_-]`).
///
/// Used as the identity key for open documents and history entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: &str) -> Result<Self, CliptubeError> {
        if raw.len() == VIDEO_ID_LEN && raw.bytes().all(is_id_byte) {
            Ok(Self(raw.to_string()))
        } else {
            Err(CliptubeError::InvalidVideoId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The watch URL this id opens, e.g. `https://www.youtube.com/watch?v=dQw4w9WgXcQ`.
    pub fn canonical_url(&self) -> String {
        canonical_url(self)
    }
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl TryFrom<String> for VideoId {
    type Error = CliptubeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

impl std::str::FromStr for VideoId {
    type Err = CliptubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn canonical_url(id: &VideoId) -> String {
    format!("{CANONICAL_URL_PREFIX}{}", id.as_str())
}

/// Non-owning handle to a player window; the player owns the window table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window#{}", self.0)
    }
}
