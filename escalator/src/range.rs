use core::fmt;

/// A half-open integer interval `[start, end)`.
///
/// Used for logical row ranges, visual (deque) ranges and column ranges. An empty range has
/// `start == end` and behaves as a no-op everywhere it is consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    start: usize,
    end: usize,
}

impl Range {
    /// Creates the range `[start, end)`.
    ///
    /// `end` is clamped to `start` so the result is never inverted.
    pub fn between(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {start} is after end {end}");
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn with_length(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    /// A range containing only `index`.
    pub fn with_only(index: usize) -> Self {
        Self::with_length(index, 1)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// Whether the two ranges share at least one index.
    ///
    /// Empty ranges intersect nothing.
    pub fn intersects(&self, other: &Range) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    pub fn is_subset_of(&self, other: &Range) -> bool {
        self.is_empty() || (other.start <= self.start && self.end <= other.end)
    }

    pub fn starts_before(&self, other: &Range) -> bool {
        self.start < other.start
    }

    pub fn ends_after(&self, other: &Range) -> bool {
        self.end > other.end
    }

    /// Splits `self` into the parts before, inside and after `other`.
    ///
    /// The three parts are always contiguous and together cover `self`; any of them can be
    /// empty.
    pub fn partition_with(&self, other: &Range) -> [Range; 3] {
        let clamp = |i: usize| i.clamp(self.start, self.end);
        let inside_start = clamp(other.start);
        let inside_end = clamp(other.end).max(inside_start);
        if other.is_empty() {
            // Nothing is inside an empty range; split at its position instead.
            let pivot = clamp(other.start);
            return [
                Range::between(self.start, pivot),
                Range::with_length(pivot, 0),
                Range::between(pivot, self.end),
            ];
        }
        [
            Range::between(self.start, inside_start),
            Range::between(inside_start, inside_end),
            Range::between(inside_end, self.end),
        ]
    }

    /// Intersection of the two ranges, or an empty range at `self.start`.
    pub fn restrict_to(&self, other: &Range) -> Range {
        let [_, inside, _] = self.partition_with(other);
        if inside.is_empty() {
            Range::with_length(self.start, 0)
        } else {
            inside
        }
    }

    /// Moves the range by `delta`.
    ///
    /// Saturates at zero; callers that offset by a negative amount must only do so for ranges
    /// known to lie past the offset.
    pub fn offset_by(&self, delta: isize) -> Range {
        let shift = |i: usize| {
            if delta >= 0 {
                i.saturating_add(delta.unsigned_abs())
            } else {
                i.saturating_sub(delta.unsigned_abs())
            }
        };
        Range {
            start: shift(self.start),
            end: shift(self.end),
        }
    }

    /// The smallest range enclosing both ranges. Empty ranges are ignored.
    pub fn combine_with(&self, other: &Range) -> Range {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Grows the range by `before` at the start (saturating) and `after` at the end.
    pub fn expand(&self, before: usize, after: usize) -> Range {
        Range {
            start: self.start.saturating_sub(before),
            end: self.end.saturating_add(after),
        }
    }

    /// Splits at the absolute index `at`, clamped into the range.
    pub fn split_at(&self, at: usize) -> (Range, Range) {
        let at = at.clamp(self.start, self.end);
        (Range::between(self.start, at), Range::between(at, self.end))
    }

    /// Splits after the first `len` indexes.
    pub fn split_at_from_start(&self, len: usize) -> (Range, Range) {
        self.split_at(self.start.saturating_add(len))
    }

    pub fn iter(&self) -> core::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<core::ops::Range<usize>> for Range {
    fn from(r: core::ops::Range<usize>) -> Self {
        Range::between(r.start, r.end.max(r.start))
    }
}

impl IntoIterator for Range {
    type Item = usize;
    type IntoIter = core::ops::Range<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}
