pub mod traits;
pub mod youtube;

pub use traits::{ResolvedVideo, StreamKind, StreamSource, VideoResolver};
pub use youtube::{YouTubeClient, YouTubeError};
