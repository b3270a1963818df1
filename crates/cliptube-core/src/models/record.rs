use serde::{Deserialize, Serialize};

use super::VideoId;

/// One persisted history item. Files store these newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: VideoId,
    pub title: String,
}

impl HistoryRecord {
    pub fn new(id: VideoId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}
