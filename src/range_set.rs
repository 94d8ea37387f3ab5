//! Sorted set of half-open byte ranges, used to track which parts of a host
//! buffer have been written since the last device upload.

use std::ops::Range;

/// A set of disjoint `[start, end)` byte ranges.
///
/// Ranges are kept sorted, and overlapping or touching ranges are merged on
/// insertion, so two stored ranges always have a gap between them. The number
/// of stored ranges is bounded by the number of separate edit regions since
/// the last [`clear`](Self::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteRangeSet {
    ranges: Vec<Range<usize>>,
}

impl ByteRangeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `[start, end)` to the set. Empty ranges are ignored.
    pub fn mark_dirty(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }

        // First stored range that ends at or after `start` (touching counts).
        let lo = self.ranges.partition_point(|r| r.end < start);
        // One past the last stored range that starts at or before `end`.
        let hi = self.ranges.partition_point(|r| r.start <= end);

        if lo < hi {
            let merged = self.ranges[lo].start.min(start)..self.ranges[hi - 1].end.max(end);
            self.ranges.splice(lo..hi, std::iter::once(merged));
        } else {
            self.ranges.insert(lo, start..end);
        }
    }

    /// Whether `offset` lies inside any stored range.
    pub fn contains(&self, offset: usize) -> bool {
        let i = self.ranges.partition_point(|r| r.end <= offset);
        self.ranges.get(i).is_some_and(|r| r.start <= offset)
    }

    /// Stored ranges in ascending order.
    pub fn ranges(&self) -> impl ExactSizeIterator<Item = Range<usize>> + '_ {
        self.ranges.iter().cloned()
    }

    /// The lowest stored range.
    pub fn first(&self) -> Option<Range<usize>> {
        self.ranges.first().cloned()
    }

    /// Number of disjoint ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of bytes covered.
    pub fn covered_bytes(&self) -> usize {
        self.ranges.iter().map(ExactSizeIterator::len).sum()
    }

    /// Forget every range.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Move the contents out, leaving the set empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn collect(set: &ByteRangeSet) -> Vec<Range<usize>> {
        set.ranges().collect()
    }

    #[test]
    fn disjoint_ranges_stay_sorted() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(40, 48);
        set.mark_dirty(0, 8);
        set.mark_dirty(16, 24);
        assert_eq!(collect(&set), vec![0..8, 16..24, 40..48]);
        assert_eq!(set.first(), Some(0..8));
    }

    #[test]
    fn overlapping_ranges_merge() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(0, 10);
        set.mark_dirty(5, 20);
        assert_eq!(collect(&set), vec![0..20]);
    }

    #[test]
    fn adjacent_ranges_merge() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(0, 8);
        set.mark_dirty(8, 16);
        set.mark_dirty(24, 32);
        set.mark_dirty(16, 24);
        assert_eq!(collect(&set), vec![0..32]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn spanning_range_swallows_several() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(0, 4);
        set.mark_dirty(10, 14);
        set.mark_dirty(20, 24);
        set.mark_dirty(30, 34);
        set.mark_dirty(2, 22);
        assert_eq!(collect(&set), vec![0..24, 30..34]);
    }

    #[test]
    fn contained_range_is_noop() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(0, 100);
        set.mark_dirty(10, 20);
        assert_eq!(collect(&set), vec![0..100]);
    }

    #[test]
    fn empty_range_ignored() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(5, 5);
        set.mark_dirty(9, 3);
        assert!(set.is_empty());
        assert_eq!(set.first(), None);
    }

    #[test]
    fn contains_respects_half_open_bounds() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(8, 16);
        set.mark_dirty(32, 40);
        assert!(!set.contains(7));
        assert!(set.contains(8));
        assert!(set.contains(15));
        assert!(!set.contains(16));
        assert!(!set.contains(31));
        assert!(set.contains(39));
        assert!(!set.contains(40));
    }

    #[test]
    fn clear_and_take_empty_the_set() {
        let mut set = ByteRangeSet::new();
        set.mark_dirty(0, 8);
        set.mark_dirty(16, 20);
        assert_eq!(set.covered_bytes(), 12);

        let taken = set.take();
        assert!(set.is_empty());
        assert_eq!(taken.len(), 2);

        let mut again = taken.clone();
        again.clear();
        assert!(again.is_empty());
    }
}
