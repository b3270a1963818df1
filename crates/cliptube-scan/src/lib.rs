//! Find YouTube video ids in arbitrary text (clipboard contents, pasted
//! HTML, chat logs).

pub mod scanner;

pub use scanner::{find_video_ids, has_video_ids};
