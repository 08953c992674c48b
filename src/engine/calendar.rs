use serde::{Deserialize, Serialize};

use crate::model::{Minutes, Span};

/// Ordered set of disjoint free intervals, merged on insert.
///
/// Invariant after every call: sorted ascending by start, and strictly
/// separated — for any adjacent pair `[a,b) [c,d)`, `b < c`. Intervals that
/// touch at a boundary are merged into one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalCalendar {
    intervals: Vec<Span>,
}

impl IntervalCalendar {
    pub fn new() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Open `[start, end)` for use. Merges with every existing interval the
    /// new one overlaps or touches. Non-positive-length input is dropped.
    pub fn add_available(&mut self, start: Minutes, end: Minutes) {
        if start >= end {
            return;
        }
        let mut merged = Span::new(start, end);
        let mut out = Vec::with_capacity(self.intervals.len() + 1);
        let mut placed = false;
        for &existing in &self.intervals {
            if existing.end < merged.start {
                out.push(existing);
            } else if merged.end < existing.start {
                if !placed {
                    out.push(merged);
                    placed = true;
                }
                out.push(existing);
            } else {
                merged = Span::new(
                    merged.start.min(existing.start),
                    merged.end.max(existing.end),
                );
            }
        }
        if !placed {
            out.push(merged);
        }
        self.intervals = out;
    }

    /// True iff a single free interval fully contains `[start, end)`.
    /// A request across a gap is never satisfiable.
    pub fn is_available(&self, start: Minutes, end: Minutes) -> bool {
        if start >= end {
            return false;
        }
        self.candidate_index(start)
            .is_some_and(|i| self.intervals[i].end >= end)
    }

    /// Claim `[start, end)` out of the free interval containing it, leaving
    /// the 0–2 remainders free. Returns false when no single interval
    /// contains the request.
    pub fn reserve(&mut self, start: Minutes, end: Minutes) -> bool {
        if start >= end {
            return false;
        }
        let Some(idx) = self.candidate_index(start) else {
            return false;
        };
        let found = self.intervals[idx];
        if found.end < end {
            return false;
        }
        self.intervals.remove(idx);
        let mut insert_at = idx;
        if found.start < start {
            self.intervals.insert(insert_at, Span::new(found.start, start));
            insert_at += 1;
        }
        if end < found.end {
            self.intervals.insert(insert_at, Span::new(end, found.end));
        }
        true
    }

    /// Index of the only interval that can contain a range starting at
    /// `start`: the last one starting at or before it, if it reaches past it.
    fn candidate_index(&self, start: Minutes) -> Option<usize> {
        let idx = self.intervals.partition_point(|iv| iv.start <= start);
        if idx == 0 {
            return None;
        }
        (self.intervals[idx - 1].end > start).then_some(idx - 1)
    }
}
