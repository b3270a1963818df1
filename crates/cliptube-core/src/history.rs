//! Bounded "recently opened" history.
//!
//! Entries are keyed by video id and stamped with a value from one shared,
//! strictly increasing counter on every insert or touch. Recency order is
//! derived from the stamps, so no linked list is needed: the newest entry has
//! the largest sequence and the eviction victim is the smallest one. Capacity
//! is small (tens to a few hundred), so eviction is a linear scan.

use std::collections::{HashMap, HashSet};

use crate::models::{HistoryRecord, VideoId};

/// A history entry as returned by [`History::items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: VideoId,
    pub title: String,
    pub sequence: u64,
}

#[derive(Debug, Clone)]
struct Stamped {
    sequence: u64,
    title: String,
}

/// Ordered history of titles (keyed by unique video id) up to `max_size`,
/// newest first.
#[derive(Debug, Clone)]
pub struct History {
    max_size: usize,
    entries: HashMap<VideoId, Stamped>,
    next_sequence: u64,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Rebuild a history from persisted records (newest-first).
    ///
    /// Records are reinserted oldest-first so the derived sequences
    /// reproduce the stored order. Surplus records beyond `max_size` are the
    /// oldest ones and get evicted on the way in.
    pub fn from_records(max_size: usize, records: impl IntoIterator<Item = HistoryRecord>) -> Self {
        let records: Vec<HistoryRecord> = records.into_iter().collect();
        let mut history = Self::new(max_size);
        for record in records.into_iter().rev() {
            history.add(record.id, record.title);
        }
        history
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &VideoId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn title(&self, id: &VideoId) -> Option<&str> {
        self.entries.get(id).map(|e| e.title.as_str())
    }

    /// Change the capacity.
    ///
    /// Growing (or keeping) the bound never touches the contents. Shrinking
    /// below the current count keeps the `max_size` newest entries and drops
    /// the rest. Returns `true` if entries were dropped; the caller must then
    /// write the history back to storage since the eviction is irreversible.
    pub fn set_max_size(&mut self, max_size: usize) -> bool {
        self.max_size = max_size;
        if max_size >= self.entries.len() {
            return false;
        }

        let keep: HashSet<VideoId> = self
            .items()
            .into_iter()
            .take(max_size)
            .map(|e| e.id)
            .collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| keep.contains(id));
        tracing::debug!(
            max_size,
            evicted = before - self.entries.len(),
            "History truncated"
        );
        true
    }

    /// Insert a new entry or touch an existing one.
    ///
    /// A touched entry gets a fresh sequence (moves to the front) and its
    /// title replaced. A new entry at capacity first evicts the oldest one.
    /// With `max_size == 0` nothing is ever kept.
    pub fn add(&mut self, id: VideoId, title: impl Into<String>) {
        debug_assert!(
            self.entries.len() <= self.max_size,
            "history holds {} entries, max is {}",
            self.entries.len(),
            self.max_size
        );
        if self.max_size == 0 {
            return;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let title = title.into();

        if let Some(existing) = self.entries.get_mut(&id) {
            existing.sequence = sequence;
            existing.title = title;
        } else {
            if self.entries.len() >= self.max_size {
                self.evict_oldest();
            }
            self.entries.insert(id, Stamped { sequence, title });
        }

        debug_assert!(self.entries.len() <= self.max_size);
    }

    /// Remove every entry whose id is not in `keep`.
    pub fn clear(&mut self, keep: &HashSet<VideoId>) {
        if keep.is_empty() {
            self.entries.clear();
        } else {
            self.entries.retain(|id, _| keep.contains(id));
        }
    }

    /// All entries, newest first.
    pub fn items(&self) -> Vec<HistoryEntry> {
        let mut items: Vec<HistoryEntry> = self
            .entries
            .iter()
            .map(|(id, e)| HistoryEntry {
                id: id.clone(),
                title: e.title.clone(),
                sequence: e.sequence,
            })
            .collect();
        items.sort_unstable_by(|a, b| b.sequence.cmp(&a.sequence));
        items
    }

    /// The persisted shape: `(id, title)` pairs, newest first.
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.items()
            .into_iter()
            .map(|e| HistoryRecord::new(e.id, e.title))
            .collect()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.sequence)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.entries.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(c: char) -> VideoId {
        VideoId::parse(&c.to_string().repeat(11)).unwrap()
    }

    fn pairs(history: &History) -> Vec<(VideoId, String)> {
        history
            .items()
            .into_iter()
            .map(|e| (e.id, e.title))
            .collect()
    }

    fn abc() -> History {
        let mut h = History::new(3);
        h.add(vid('A'), "a");
        h.add(vid('B'), "b");
        h.add(vid('C'), "c");
        h
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut h = abc();
        h.add(vid('D'), "d");
        assert_eq!(
            pairs(&h),
            vec![
                (vid('D'), "d".to_string()),
                (vid('C'), "c".to_string()),
                (vid('B'), "b".to_string()),
            ]
        );
        assert!(!h.contains(&vid('A')));
    }

    #[test]
    fn test_touch_moves_to_front() {
        let mut h = abc();
        h.add(vid('D'), "d");
        h.add(vid('B'), "b2");
        assert_eq!(
            pairs(&h),
            vec![
                (vid('B'), "b2".to_string()),
                (vid('D'), "d".to_string()),
                (vid('C'), "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_touch_keeps_count_and_updates_title() {
        let mut h = abc();
        h.add(vid('A'), "renamed");
        assert_eq!(h.count(), 3);
        assert_eq!(h.title(&vid('A')), Some("renamed"));
        assert_eq!(h.items()[0].id, vid('A'));
    }

    #[test]
    fn test_count_never_exceeds_max() {
        let mut h = History::new(4);
        for (i, c) in "ABCDEFGHIJABCXYZ".chars().enumerate() {
            h.add(vid(c), format!("title {i}"));
            assert!(h.count() <= 4, "count {} after adding {c}", h.count());
        }
    }

    #[test]
    fn test_eviction_picks_smallest_sequence() {
        let mut h = abc();
        // A is touched, so B now has the smallest sequence.
        h.add(vid('A'), "a");
        let min = h.items().into_iter().min_by_key(|e| e.sequence).unwrap();
        assert_eq!(min.id, vid('B'));
        h.add(vid('D'), "d");
        assert!(!h.contains(&vid('B')));
        assert!(h.contains(&vid('A')));
    }

    #[test]
    fn test_items_strictly_descending() {
        let mut h = History::new(10);
        for c in "ABCDEBCA".chars() {
            h.add(vid(c), c.to_string());
        }
        let items = h.items();
        assert!(items.windows(2).all(|w| w[0].sequence > w[1].sequence));
        assert_eq!(items, h.items());
    }

    #[test]
    fn test_shrink_keeps_newest() {
        let mut h = abc();
        assert!(h.set_max_size(1));
        assert_eq!(pairs(&h), vec![(vid('C'), "c".to_string())]);
        assert_eq!(h.max_size(), 1);
    }

    #[test]
    fn test_shrink_respects_touch_order() {
        let mut h = abc();
        h.add(vid('A'), "a");
        assert!(h.set_max_size(2));
        assert_eq!(
            pairs(&h),
            vec![(vid('A'), "a".to_string()), (vid('C'), "c".to_string())]
        );
    }

    #[test]
    fn test_set_max_size_idempotent() {
        let mut h = abc();
        assert!(h.set_max_size(2));
        let after_first = pairs(&h);
        assert!(!h.set_max_size(2));
        assert_eq!(pairs(&h), after_first);
    }

    #[test]
    fn test_grow_is_noop_on_contents() {
        let mut h = abc();
        let before = pairs(&h);
        assert!(!h.set_max_size(10));
        assert_eq!(pairs(&h), before);
        h.add(vid('D'), "d");
        assert_eq!(h.count(), 4);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut h = History::new(0);
        for c in "ABC".chars() {
            h.add(vid(c), "x");
            assert_eq!(h.count(), 0);
        }
        assert!(h.items().is_empty());
    }

    #[test]
    fn test_huge_max_size_does_not_preallocate() {
        let mut h = History::new(1 << 40);
        h.add(vid('A'), "a");
        assert_eq!(h.count(), 1);

        let mut h = History::new(usize::MAX);
        h.add(vid('A'), "a");
        h.add(vid('B'), "b");
        assert_eq!(h.count(), 2);
        assert_eq!(h.items()[0].id, vid('B'));
    }

    #[test]
    fn test_shrink_to_zero() {
        let mut h = abc();
        assert!(h.set_max_size(0));
        assert!(h.is_empty());
        h.add(vid('D'), "d");
        assert!(h.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let mut h = abc();
        h.clear(&HashSet::new());
        assert!(h.is_empty());
    }

    #[test]
    fn test_clear_keeping_preserves_order() {
        let mut h = History::new(5);
        for c in "ABCDE".chars() {
            h.add(vid(c), c.to_string());
        }
        let keep: HashSet<VideoId> = [vid('B'), vid('D'), vid('Z')].into_iter().collect();
        h.clear(&keep);
        let ids: Vec<VideoId> = h.items().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![vid('D'), vid('B')]);
    }

    #[test]
    fn test_records_roundtrip() {
        let mut h = History::new(4);
        for c in "ABCDBE".chars() {
            h.add(vid(c), format!("{c} title"));
        }
        let restored = History::from_records(4, h.records());
        assert_eq!(pairs(&restored), pairs(&h));
    }

    #[test]
    fn test_from_records_truncates_to_newest() {
        let records = vec![
            HistoryRecord::new(vid('C'), "c"),
            HistoryRecord::new(vid('B'), "b"),
            HistoryRecord::new(vid('A'), "a"),
        ];
        let h = History::from_records(2, records);
        assert_eq!(
            pairs(&h),
            vec![(vid('C'), "c".to_string()), (vid('B'), "b".to_string())]
        );
    }
}
