pub mod config;
pub mod documents;
pub mod error;
pub mod history;
pub mod models;
pub mod notify;
pub mod persist;

pub use documents::OpenDocuments;
pub use error::CliptubeError;
pub use history::History;
pub use models::{canonical_url, HistoryRecord, VideoId, WindowId, CANONICAL_URL_PREFIX};
