//! Index of currently open documents, keyed by canonical video id.
//!
//! Each document holds a plain [`WindowId`] into the player's window table
//! rather than owning the window. Window close events call
//! [`OpenDocuments::unregister_window`] explicitly.

use std::collections::HashMap;

use crate::models::{VideoId, WindowId};

/// At most one open document per video id.
#[derive(Debug, Default, Clone)]
pub struct OpenDocuments {
    by_id: HashMap<VideoId, WindowId>,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window currently showing `id`, if any.
    pub fn find_open(&self, id: &VideoId) -> Option<WindowId> {
        self.by_id.get(id).copied()
    }

    /// Record that `window` now shows `id`.
    ///
    /// Callers check [`OpenDocuments::find_open`] first; registering an id
    /// twice is a bug. Release builds keep the existing registration and
    /// hand the rejected window back so the caller can close it.
    pub fn register(&mut self, id: VideoId, window: WindowId) -> Result<(), WindowId> {
        debug_assert!(
            !self.by_id.contains_key(&id),
            "{id} already registered to {}",
            self.by_id[&id]
        );
        if self.by_id.contains_key(&id) {
            return Err(window);
        }
        self.by_id.insert(id, window);
        Ok(())
    }

    /// Forget `id`. Does nothing if it is not registered.
    pub fn unregister(&mut self, id: &VideoId) -> Option<WindowId> {
        self.by_id.remove(id)
    }

    /// Forget `id` only if it is registered to `window`.
    ///
    /// Close notifications for windows that lost a registration race must
    /// not remove the winner.
    pub fn unregister_window(&mut self, id: &VideoId, window: WindowId) -> bool {
        if self.find_open(id) == Some(window) {
            self.by_id.remove(id);
            true
        } else {
            false
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &VideoId> {
        self.by_id.keys()
    }

    pub fn windows(&self) -> impl Iterator<Item = (&VideoId, WindowId)> {
        self.by_id.iter().map(|(id, w)| (id, *w))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(c: char) -> VideoId {
        VideoId::parse(&c.to_string().repeat(11)).unwrap()
    }

    #[test]
    fn test_register_and_find() {
        let mut docs = OpenDocuments::new();
        assert_eq!(docs.find_open(&vid('A')), None);
        docs.register(vid('A'), WindowId(1)).unwrap();
        assert_eq!(docs.find_open(&vid('A')), Some(WindowId(1)));
        assert_eq!(docs.len(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_register_asserts() {
        let mut docs = OpenDocuments::new();
        docs.register(vid('A'), WindowId(1)).unwrap();
        let _ = docs.register(vid('A'), WindowId(2));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_duplicate_register_keeps_first() {
        let mut docs = OpenDocuments::new();
        docs.register(vid('A'), WindowId(1)).unwrap();
        assert_eq!(docs.register(vid('A'), WindowId(2)), Err(WindowId(2)));
        assert_eq!(docs.find_open(&vid('A')), Some(WindowId(1)));
    }

    #[test]
    fn test_unregister_idempotent() {
        let mut docs = OpenDocuments::new();
        docs.register(vid('A'), WindowId(1)).unwrap();
        assert_eq!(docs.unregister(&vid('A')), Some(WindowId(1)));
        assert_eq!(docs.unregister(&vid('A')), None);
        assert!(docs.is_empty());
    }

    #[test]
    fn test_unregister_window_ignores_stale_close() {
        let mut docs = OpenDocuments::new();
        docs.register(vid('A'), WindowId(1)).unwrap();
        assert!(!docs.unregister_window(&vid('A'), WindowId(7)));
        assert_eq!(docs.find_open(&vid('A')), Some(WindowId(1)));
        assert!(docs.unregister_window(&vid('A'), WindowId(1)));
        assert!(docs.is_empty());
    }
}
