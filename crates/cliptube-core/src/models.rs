mod record;
mod video;

pub use record::HistoryRecord;
pub use video::{canonical_url, VideoId, WindowId, CANONICAL_URL_PREFIX, VIDEO_ID_LEN};
