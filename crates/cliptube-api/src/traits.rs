//! Trait definitions for video resolution.
//!
//! The runtime only needs "given an id, fetch a title and something playable;
//! this may fail". Any extraction backend implements [`VideoResolver`], which
//! keeps the session logic independent of the backend and testable with fakes.

use std::future::Future;

use cliptube_core::models::VideoId;
use url::Url;

/// Resolves a video id into a title and a playable stream.
///
/// Implementations may be slow and may fail; callers impose no timeout and
/// never retry.
pub trait VideoResolver: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn resolve(
        &self,
        id: &VideoId,
    ) -> impl Future<Output = Result<ResolvedVideo, Self::Error>> + Send;
}

/// A video ready to hand to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVideo {
    pub id: VideoId,
    pub title: String,
    pub author: Option<String>,
    pub length_seconds: Option<u64>,
    pub stream: StreamSource,
}

/// Where the player reads the media from.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSource {
    pub url: Url,
    pub kind: StreamKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Single muxed audio+video file identified by its itag.
    Progressive { itag: u32 },
    /// HTTP Live Streaming manifest (live broadcasts).
    Hls,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progressive { itag } => write!(f, "itag {itag}"),
            Self::Hls => write!(f, "HLS"),
        }
    }
}
