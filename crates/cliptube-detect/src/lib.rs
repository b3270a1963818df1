//! Clipboard change detection.
//!
//! [`ClipboardSource`] abstracts the system clipboard behind a change
//! counter; [`ClipboardWatcher`] polls a source on an interval and forwards
//! the text of each change.

pub mod clipboard;
pub mod watcher;

pub use clipboard::{ClipboardError, ClipboardSource, SystemClipboard};
pub use watcher::{ClipboardWatcher, DEFAULT_POLL_INTERVAL};
