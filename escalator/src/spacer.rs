use std::collections::BTreeMap;

use crate::{Clip, ElementId, PositionTracker, Range, SpacerHandle, SpacerInclusion, Surface};

/// One spacer: a row-like shell placed below body row `row`.
#[derive(Clone, Debug)]
pub(crate) struct Spacer {
    pub(crate) row: isize,
    pub(crate) root: ElementId,
    pub(crate) content: ElementId,
    pub(crate) deco: ElementId,
    /// Negative until the first height is applied.
    pub(crate) height: f64,
}

impl Spacer {
    pub(crate) fn height(&self) -> f64 {
        self.height.max(0.0)
    }

    pub(crate) fn handle(&self) -> SpacerHandle {
        SpacerHandle {
            row: self.row,
            root: self.root,
            content: self.content,
            decoration: self.deco,
            height: self.height(),
        }
    }

    /// Places the root at `(x, y)` and the decoration one row height above it.
    pub(crate) fn set_position<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        positions: &mut PositionTracker,
        x: f64,
        y: f64,
        row_height: f64,
    ) {
        positions.set(surface, self.root, x, y);
        positions.set(surface, self.deco, 0.0, y - row_height);
    }

    pub(crate) fn shift<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        positions: &mut PositionTracker,
        dy: f64,
        row_height: f64,
    ) {
        let (x, y) = positions.get(self.root).unwrap_or((0.0, 0.0));
        self.set_position(surface, positions, x, y + dy, row_height);
    }

    pub(crate) fn set_displayed<S: Surface + ?Sized>(&self, surface: &mut S, displayed: bool) {
        surface.set_displayed(self.root, displayed);
        surface.set_displayed(self.deco, displayed);
    }
}

/// Sparse map from body row index to spacer, with pixel range queries.
///
/// Spacer tops are read from the position ledger; the store only owns indexes and heights.
#[derive(Clone, Debug, Default)]
pub(crate) struct SpacerStore {
    spacers: BTreeMap<isize, Spacer>,
}

impl SpacerStore {
    pub(crate) fn len(&self) -> usize {
        self.spacers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.spacers.is_empty()
    }

    pub(crate) fn get(&self, row: isize) -> Option<&Spacer> {
        self.spacers.get(&row)
    }

    pub(crate) fn get_mut(&mut self, row: isize) -> Option<&mut Spacer> {
        self.spacers.get_mut(&row)
    }

    pub(crate) fn exists(&self, row: isize) -> bool {
        self.spacers.contains_key(&row)
    }

    pub(crate) fn insert(&mut self, spacer: Spacer) {
        let previous = self.spacers.insert(spacer.row, spacer);
        debug_assert!(previous.is_none(), "replaced an existing spacer");
    }

    pub(crate) fn remove(&mut self, row: isize) -> Option<Spacer> {
        self.spacers.remove(&row)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Spacer> {
        self.spacers.values()
    }

    /// Spacers whose row lies in `[from, to)`.
    pub(crate) fn rows_between(&self, from: isize, to: isize) -> Vec<isize> {
        if from >= to {
            return Vec::new();
        }
        self.spacers.range(from..to).map(|(row, _)| *row).collect()
    }

    pub(crate) fn drain(&mut self) -> Vec<Spacer> {
        std::mem::take(&mut self.spacers).into_values().collect()
    }

    /// Height of the spacer below `row`, or zero.
    pub(crate) fn height_of(&self, row: isize) -> f64 {
        self.spacers.get(&row).map_or(0.0, Spacer::height)
    }

    pub(crate) fn sum(&self) -> f64 {
        self.spacers.values().map(Spacer::height).sum()
    }

    /// Sum of the spacers strictly before logical row `row`.
    pub(crate) fn sum_until_index(&self, row: isize) -> f64 {
        self.spacers.range(..row).map(|(_, s)| s.height()).sum()
    }

    /// Pixels occupied by spacers between `range_top` and `range_bottom`.
    ///
    /// A spacer straddling a boundary is counted according to that boundary's inclusion rule.
    /// When a single spacer straddles both boundaries the top rule wins.
    pub(crate) fn sum_between_px(
        &self,
        positions: &PositionTracker,
        range_top: f64,
        top_inclusion: SpacerInclusion,
        range_bottom: f64,
        bottom_inclusion: SpacerInclusion,
    ) -> f64 {
        debug_assert!(range_top <= range_bottom, "range top {range_top} is below {range_bottom}");
        let mut heights = 0.0;
        for spacer in self.spacers.values() {
            let top = positions.top(spacer.root).unwrap_or(0.0);
            let height = spacer.height();
            let bottom = top + height;

            let top_above = top < range_top;
            let top_below = range_bottom < top;
            let bottom_above = bottom < range_top;
            let bottom_below = range_bottom < bottom;

            if bottom_above {
                continue;
            }
            if top_below {
                return heights;
            }
            match (top_above, bottom_below) {
                (true, false) => match top_inclusion {
                    SpacerInclusion::Partial => heights += bottom - range_top,
                    SpacerInclusion::Complete => heights += height,
                    SpacerInclusion::None => {}
                },
                (true, true) => {
                    return match top_inclusion {
                        SpacerInclusion::None => 0.0,
                        SpacerInclusion::Complete => height,
                        SpacerInclusion::Partial => range_bottom - range_top,
                    };
                }
                (false, false) => heights += height,
                (false, true) => {
                    match bottom_inclusion {
                        SpacerInclusion::Partial => heights += range_bottom - top,
                        SpacerInclusion::Complete => heights += height,
                        SpacerInclusion::None => {}
                    }
                    return heights;
                }
            }
        }
        heights
    }

    pub(crate) fn sum_until_px(&self, positions: &PositionTracker, px: f64) -> f64 {
        self.sum_between_px(
            positions,
            0.0,
            SpacerInclusion::Partial,
            px.max(0.0),
            SpacerInclusion::Partial,
        )
    }

    /// Rows of the spacers from pixel `px` onwards, in row order.
    ///
    /// A spacer containing `px` is included unless `inclusion` is [`SpacerInclusion::None`].
    pub(crate) fn rows_after_px(
        &self,
        positions: &PositionTracker,
        px: f64,
        inclusion: SpacerInclusion,
    ) -> Vec<isize> {
        let rows: Vec<(isize, f64, f64)> = self
            .spacers
            .values()
            .map(|s| {
                let top = positions.top(s.root).unwrap_or(0.0);
                (s.row, top, top + s.height())
            })
            .collect();
        for (i, &(_, top, bottom)) in rows.iter().enumerate() {
            if top > px {
                return rows[i..].iter().map(|r| r.0).collect();
            }
            if bottom > px {
                let from = if inclusion == SpacerInclusion::None { i + 1 } else { i };
                return rows[from..].iter().map(|r| r.0).collect();
            }
        }
        Vec::new()
    }

    /// Moves every spacer strictly after `row` by `dy` pixels.
    pub(crate) fn shift_positions_after_row<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        positions: &mut PositionTracker,
        row: isize,
        dy: f64,
        row_height: f64,
    ) {
        if dy == 0.0 {
            return;
        }
        let start = row.saturating_add(1);
        for spacer in self.spacers.range(start..).map(|(_, s)| s) {
            spacer.shift(surface, positions, dy, row_height);
        }
    }

    /// Reindexes every spacer at or after `index` by `delta` rows and moves it accordingly.
    pub(crate) fn shift_by_rows<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        positions: &mut PositionTracker,
        index: isize,
        delta: isize,
        row_height: f64,
    ) {
        if delta == 0 {
            return;
        }
        let tail = self.spacers.split_off(&index);
        let dy = delta as f64 * row_height;
        for (_, mut spacer) in tail {
            spacer.shift(surface, positions, dy, row_height);
            spacer.row += delta;
            vtrace!(row = spacer.row, delta, "spacer reindexed");
            let previous = self.spacers.insert(spacer.row, spacer);
            debug_assert!(previous.is_none(), "spacer shift collided with an existing spacer");
        }
    }

    /// Whether the spacer's pixels intersect `[viewport_top, viewport_top + viewport_height)`.
    pub(crate) fn is_in_viewport(
        &self,
        positions: &PositionTracker,
        spacer: &Spacer,
        viewport_top: f64,
        viewport_height: f64,
    ) -> bool {
        let top = positions.top(spacer.root).unwrap_or(0.0).ceil().max(0.0) as usize;
        let height = spacer.height().floor().max(0.0) as usize;
        let viewport = Range::with_length(
            viewport_top.floor().max(0.0) as usize,
            viewport_height.max(0.0) as usize,
        );
        viewport.intersects(&Range::with_length(top, height))
    }

    /// The clip keeping a decoration inside the body viewport, or `None` if it fits.
    pub(crate) fn deco_clip(
        positions: &PositionTracker,
        spacer: &Spacer,
        row_height: f64,
        viewport_top: f64,
        viewport_bottom: f64,
    ) -> Option<Clip> {
        let top = positions.top(spacer.deco).unwrap_or(0.0);
        let height = spacer.height() + row_height;
        let bottom = top + height;
        if top < viewport_top || bottom > viewport_bottom {
            Some(Clip {
                top: (viewport_top - top).max(0.0),
                bottom: height - (bottom - viewport_bottom).max(0.0),
            })
        } else {
            None
        }
    }
}
