use std::collections::{HashSet, VecDeque};

use crate::scrollbar::pixel_values_equal;
use crate::section::{RowElement, SectionCore, Shared};
use crate::spacer::{Spacer, SpacerStore};
use crate::updater::{BoxedSpacerUpdater, NullUpdater};
use crate::{
    ElementId, ElementKind, EscalatorError, Range, Result, Section, SpacerHandle, Surface,
    scroller,
};

/// The virtualized body.
///
/// Holds a pool of row elements (`visual`) bound to the contiguous logical rows
/// `top..top + visual.len()`. Scrolling rebinds and repositions pool rows instead of creating
/// new ones; the physical order on the surface is fixed later by a deferred sort.
pub(crate) struct BodySection {
    pub(crate) core: SectionCore,
    visual: VecDeque<RowElement>,
    top: usize,
    pub(crate) spacers: SpacerStore,
    spacer_updater: BoxedSpacerUpdater,
    /// Spacers remembered while detached, as `(row, height)`.
    detached_spacers: Vec<(isize, f64)>,
}

impl core::fmt::Debug for BodySection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BodySection")
            .field("core", &self.core)
            .field("visual", &self.visual)
            .field("top", &self.top)
            .field("spacers", &self.spacers)
            .finish_non_exhaustive()
    }
}

impl BodySection {
    pub(crate) fn new(row_height: Option<f64>) -> Self {
        Self {
            core: SectionCore::new(Section::Body, row_height),
            visual: VecDeque::new(),
            top: 0,
            spacers: SpacerStore::default(),
            spacer_updater: Box::new(NullUpdater),
            detached_spacers: Vec::new(),
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.core.rows
    }

    pub(crate) fn row_height(&self) -> f64 {
        self.core.default_row_height
    }

    pub(crate) fn dom_row_count(&self) -> usize {
        self.visual.len()
    }

    pub(crate) fn top_row_index(&self) -> usize {
        self.top
    }

    pub(crate) fn has_rendered_rows(&self) -> bool {
        !self.visual.is_empty()
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = &RowElement> {
        self.visual.iter()
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SectionCore, &mut VecDeque<RowElement>, usize) {
        (&mut self.core, &mut self.visual, self.top)
    }

    /// Logical rows currently bound to pool rows.
    pub(crate) fn visible_row_range(&self) -> Range {
        if self.visual.is_empty() {
            Range::empty()
        } else {
            Range::with_length(self.top, self.visual.len())
        }
    }

    pub(crate) fn max_capacity<S>(&self, env: &Shared<S>) -> usize {
        (env.layout.body_height() / self.row_height()).ceil() as usize + 1
    }

    pub(crate) fn row_top(&self, logical: usize) -> f64 {
        logical as f64 * self.row_height() + self.spacers.sum_until_index(logical as isize)
    }

    /// Top of the spacer below `row`; the `-1` spacer sits at zero.
    pub(crate) fn spacer_top(&self, row: isize) -> f64 {
        (row + 1) as f64 * self.row_height() + self.spacers.sum_until_index(row)
    }

    pub(crate) fn content_height(&self) -> f64 {
        self.core.rows as f64 * self.row_height() + self.spacers.sum()
    }

    fn row_top_at<S>(&self, env: &Shared<S>, visual: usize) -> f64 {
        self.visual
            .get(visual)
            .and_then(|row| env.positions.top(row.id).ok())
            .unwrap_or(0.0)
    }

    fn set_row_position<S: Surface>(&self, env: &mut Shared<S>, visual: usize, y: f64) {
        if let Some(row) = self.visual.get(visual) {
            env.positions.set(&mut env.surface, row.id, 0.0, y);
        }
    }

    /// The logical row under body pixel `px`.
    fn logical_index_at_px<S>(&self, env: &Shared<S>, px: f64) -> usize {
        let row_px = px - self.spacers.sum_until_px(&env.positions, px);
        (row_px / self.row_height()).max(0.0) as usize
    }

    /// Maps logical rows to pool indexes, truncated to the rendered rows.
    fn convert_to_visual(&self, logical: Range) -> Range {
        if logical.is_empty() || self.visual.is_empty() {
            return Range::empty();
        }
        let [_, inside, _] = logical.partition_with(&self.visible_row_range());
        inside.offset_by(-(self.top as isize))
    }

    fn fire_visibility<S: Surface>(&self, env: &Shared<S>) {
        env.fire_visibility(self.visible_row_range());
    }

    fn set_top(&mut self, top: usize) {
        vtrace!(from = self.top, to = top, "top row index");
        self.top = top;
    }

    fn all_columns<S>(env: &Shared<S>) -> Range {
        Range::with_length(0, env.columns.column_count())
    }

    fn refresh_visual<S: Surface>(&mut self, env: &mut Shared<S>, visual: usize) {
        let columns = Self::all_columns(env);
        let logical = self.top + visual;
        self.core
            .refresh_row(env, &self.visual[visual], logical, columns);
    }

    pub(crate) fn recalculate_scrollbars<S: Surface>(&self, env: &mut Shared<S>) {
        scroller::recalculate_scrollbars(env, self.content_height());
    }

    // ---- row mutations ----

    pub(crate) fn insert_rows<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        index: usize,
        count: usize,
    ) -> Result<()> {
        self.core.validate_insert(index, count)?;
        self.core.rows += count;
        vdebug!(index, count, rows = self.core.rows, "insert body rows");
        if env.attached {
            self.paint_insert_rows(env, index, count);
        } else {
            shift_remembered(&mut self.detached_spacers, index as isize, count as isize);
        }
        Ok(())
    }

    pub(crate) fn remove_rows<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        index: usize,
        count: usize,
    ) -> Result<()> {
        self.core.validate_range(index, count)?;
        self.core.rows -= count;
        vdebug!(index, count, rows = self.core.rows, "remove body rows");
        if env.attached {
            self.paint_remove_rows(env, index, count);
        } else {
            let end = (index + count) as isize;
            self.detached_spacers
                .retain(|(row, _)| *row < index as isize || *row >= end);
            shift_remembered(&mut self.detached_spacers, end, -(count as isize));
        }
        Ok(())
    }

    pub(crate) fn refresh_rows<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        index: usize,
        count: usize,
    ) -> Result<()> {
        self.core.validate_range(index, count)?;
        let columns = Self::all_columns(env);
        self.refresh_cells(env, Range::with_length(index, count), columns);
        Ok(())
    }

    pub(crate) fn refresh_cells<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        logical: Range,
        columns: Range,
    ) {
        let visual = self.convert_to_visual(logical);
        for v in visual {
            let logical = self.top + v;
            self.core
                .refresh_row(env, &self.visual[v], logical, columns);
        }
    }

    pub(crate) fn row_element(&self, index: usize) -> Result<ElementId> {
        if index >= self.core.rows {
            return Err(EscalatorError::out_of_bounds(index, 0, self.core.rows));
        }
        let visible = self.visible_row_range();
        if !visible.contains(index) {
            return Err(EscalatorError::IllegalState(format!(
                "row {index} is not rendered (rendered rows {visible})"
            )));
        }
        Ok(self.visual[index - self.top].id)
    }

    pub(crate) fn set_updater<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        updater: crate::BoxedRowUpdater,
    ) {
        self.core.updater = updater;
        let columns = Self::all_columns(env);
        self.refresh_cells(env, self.visible_row_range(), columns);
    }

    fn paint_insert_rows<S: Surface>(&mut self, env: &mut Shared<S>, index: usize, count: usize) {
        let rh = self.row_height();
        self.spacers.shift_by_rows(
            &mut env.surface,
            &mut env.positions,
            index as isize,
            count as isize,
            rh,
        );

        if index < self.top {
            // Keep the rendered rows in place; only the numbering and the scroll offset move.
            self.recalculate_scrollbars(env);
            self.move_viewport_and_content(env, count as f64 * rh);
            self.set_top(self.top + count);
            self.fire_visibility(env);
            return;
        }

        let rendered_end = self.top + self.visual.len();
        let visual_index = index.saturating_sub(self.top).min(self.visual.len());
        let added = self.fill_and_populate(env, visual_index, index, count);
        self.recalculate_scrollbars(env);
        if added == 0 && index >= rendered_end {
            // Below the rendered rows: nothing rendered changes.
            return;
        }

        let logical_start = index + added;
        let still_needed = count - added;
        if still_needed > 0 {
            let unupdated =
                self.convert_to_visual(Range::with_length(logical_start, still_needed));
            let end = self.visual.len();
            let start = end - unupdated.len();
            let target = logical_start.saturating_sub(self.top);
            self.move_and_update_rows(env, Range::between(start, end), target, logical_start);

            let reposition_from = target + (end - start);
            if reposition_from > self.visual.len() {
                vwarn!(
                    start,
                    end,
                    target,
                    rendered = self.visual.len(),
                    "ignored out-of-bounds row access while inserting"
                );
            } else {
                for v in reposition_from..self.visual.len() {
                    let y = self.row_top(self.top + v);
                    self.set_row_position(env, v, y);
                }
            }
        }
        self.fire_visibility(env);
        self.sort_dom_elements(env);
    }

    /// Adds pool rows at `visual_index` while capacity allows; returns how many were added.
    fn fill_and_populate<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        visual_index: usize,
        logical_index: usize,
        count: usize,
    ) -> usize {
        let fits = self.max_capacity(env).saturating_sub(self.visual.len());
        let needed = count.min(fits);
        if needed == 0 {
            return 0;
        }
        let visual_index = visual_index.min(self.visual.len());
        for i in 0..needed {
            let row = self.core.create_row(env);
            let reference = (visual_index + i)
                .checked_sub(1)
                .map(|previous| self.visual[previous].id);
            self.core.attach_row(env, &row, logical_index + i, reference);
            self.visual.insert(visual_index + i, row);
        }

        let rh = self.row_height();
        let mut y = self.row_top(logical_index);
        for v in visual_index..self.visual.len() {
            self.set_row_position(env, v, y);
            let logical = logical_index + (v - visual_index);
            y += rh + self.spacers.height_of(logical as isize);
        }
        vdebug!(added = needed, rendered = self.visual.len(), "filled body rows");
        needed
    }

    /// Moves the pool rows `source` to `target` and rebinds them to rows from `logical_target`.
    pub(crate) fn move_and_update_rows<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        source: Range,
        target: usize,
        logical_target: usize,
    ) {
        if source.is_empty() {
            return;
        }
        debug_assert!(
            target <= self.visual.len(),
            "visual target {target} is beyond {} rendered rows",
            self.visual.len()
        );
        debug_assert!(
            logical_target + source.len() <= self.core.rows,
            "logical target {} goes beyond {} rows",
            Range::with_length(logical_target, source.len()),
            self.core.rows
        );

        // Moving forward shifts the target left by the moved length.
        let adjusted = if source.start() < target {
            target - source.len()
        } else {
            target
        };
        if source.start() != adjusted {
            let moved: Vec<RowElement> = self.visual.drain(source.start()..source.end()).collect();
            for (offset, row) in moved.into_iter().enumerate() {
                self.visual.insert(adjusted + offset, row);
            }
        }

        let columns = Self::all_columns(env);
        for i in 0..source.len() {
            self.core
                .refresh_row(env, &self.visual[adjusted + i], logical_target + i, columns);
        }

        let rh = self.row_height();
        let mut y = self.row_top(logical_target);
        for i in 0..source.len() {
            self.set_row_position(env, adjusted + i, y);
            y += rh + self.spacers.height_of((logical_target + i) as isize);
        }
    }

    /// Scrolls by `dy` and carries the rendered rows along, snapped to whole rows.
    ///
    /// Spacers are expected to have been moved by the caller.
    pub(crate) fn move_viewport_and_content<S: Surface>(&mut self, env: &mut Shared<S>, dy: f64) {
        if dy == 0.0 {
            return;
        }
        let new_top = env.layout.body_scroll_top + dy;
        env.vertical.set_scroll_pos(new_top);

        let rh = self.row_height();
        let row_px_delta = dy - (dy % rh);
        if !pixel_values_equal(row_px_delta, 0.0) {
            for row in &self.visual {
                let y = env.positions.top(row.id).unwrap_or(0.0);
                env.positions.set(&mut env.surface, row.id, 0.0, y + row_px_delta);
            }
        }
        env.set_body_scroll_position(env.layout.body_scroll_left, new_top);
    }

    fn paint_remove_rows<S: Surface>(&mut self, env: &mut Shared<S>, index: usize, count: usize) {
        let rh = self.row_height();
        let old_top = self.top;
        let removed = Range::with_length(index, count);
        let visible = self.visible_row_range();

        self.paint_remove_spacers(env, removed);

        if self.visual.is_empty() {
            self.recalculate_scrollbars(env);
            return;
        }

        let [above, inside, _] = removed.partition_with(&visible);
        let visual_inside = self.convert_to_visual(inside);

        if !above.is_empty() {
            self.move_viewport_and_content(env, -(above.len() as f64) * rh);
            self.set_top(self.top - above.len());
        }
        if !visual_inside.is_empty() && visual_inside.start() == 0 {
            let scroll_top = env.layout.body_scroll_top;
            if scroll_top < rh {
                self.move_viewport_and_content(env, -scroll_top);
            }
        }

        if !visual_inside.is_empty() {
            if self.core.rows < self.visual.len() {
                self.remove_rows_compacting(env, visual_inside, old_top);
            } else {
                self.remove_rows_collapsing(env, visual_inside);
            }
            self.fire_visibility(env);
            self.sort_dom_elements(env);
        } else if !above.is_empty() {
            self.fire_visibility(env);
        }

        self.recalculate_scrollbars(env);
    }

    /// Fewer rows remain than are rendered: drop surplus pool rows and show everything.
    fn remove_rows_compacting<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        visual_inside: Range,
        old_top: usize,
    ) {
        let excess = self.visual.len() - self.core.rows;
        debug_assert!(excess <= visual_inside.len(), "more surplus rows than removed rows");
        let from = visual_inside.start();
        let dropped: Vec<RowElement> = self.visual.drain(from..from + excess).collect();
        for (offset, row) in dropped.into_iter().enumerate() {
            self.core.detach_row(env, row, old_top + from + offset);
        }

        env.vertical.set_scroll_pos(0.0);
        env.set_body_scroll_position(env.horizontal.scroll_pos(), 0.0);
        let dirty_from = if self.top != 0 { 0 } else { from };
        self.set_top(0);
        for v in dirty_from..self.visual.len() {
            self.refresh_visual(env, v);
            let y = self.row_top(v);
            self.set_row_position(env, v, y);
        }
        vdebug!(dropped = excess, rendered = self.visual.len(), "compacted body rows");
    }

    /// Refills the removed pool rows from below, then from above once the end is reached.
    fn remove_rows_collapsing<S: Surface>(&mut self, env: &mut Shared<S>, visual_inside: Range) {
        let len = self.visual.len();
        let k = visual_inside.len();
        let kept_end = self.top + len - k;
        let from_below = k.min(self.core.rows.saturating_sub(kept_end));
        let from_above = k - from_below;

        let freed: Vec<RowElement> = self
            .visual
            .drain(visual_inside.start()..visual_inside.end())
            .collect();
        self.visual.extend(freed);
        self.visual.rotate_right(from_above);
        self.set_top(self.top - from_above);

        if from_above > 0 {
            // The content end moved into the viewport.
            let target = (self.content_height() - env.layout.body_height()).max(0.0);
            if env.layout.body_scroll_top > target {
                env.vertical.set_scroll_pos(target);
                env.set_body_scroll_position(env.horizontal.scroll_pos(), target);
            }
        }

        for v in (0..from_above).chain(len - from_below..len) {
            self.refresh_visual(env, v);
        }
        for v in 0..len {
            let y = self.row_top(self.top + v);
            self.set_row_position(env, v, y);
        }
        vtrace!(from_above, from_below, "collapsed removed body rows");
    }

    // ---- scrolling ----

    /// Applies the scrollbar positions to the body and rebinds rows that left the viewport.
    pub(crate) fn on_vertical_scroll<S: Surface>(&mut self, env: &mut Shared<S>) {
        let left = env.horizontal.scroll_pos();
        let top = env.vertical.scroll_pos();
        env.set_body_scroll_position(left, top);
        self.update_rows_on_scroll(env);
        self.update_spacer_visibility(env);
    }

    /// Rebinds the pool so that it starts at the row under the scroll position.
    ///
    /// Rows that left one end are moved to the other; a jump past the whole pool rebinds
    /// every row in place.
    pub(crate) fn update_rows_on_scroll<S: Surface>(&mut self, env: &mut Shared<S>) {
        if self.visual.is_empty() {
            return;
        }
        let len = self.visual.len();
        let scroll_top = env.layout.body_scroll_top;
        let first = self
            .logical_index_at_px(env, scroll_top)
            .min(self.core.rows.saturating_sub(len));
        if first == self.top {
            return;
        }

        if first.abs_diff(self.top) >= len {
            self.move_and_update_rows(env, Range::between(0, len), 0, first);
        } else if first > self.top {
            let to_move = first - self.top;
            let logical = self.top + len;
            self.move_and_update_rows(env, Range::between(0, to_move), len, logical);
        } else {
            let to_move = self.top - first;
            self.move_and_update_rows(env, Range::between(len - to_move, len), 0, first);
        }
        vtrace!(from = self.top, to = first, "rebound body rows on scroll");
        self.set_top(first);
        self.fire_visibility(env);
        env.schedule_sort();
    }

    /// Grows or shrinks the pool to the capacity of the viewport.
    pub(crate) fn verify_escalator_count<S: Surface>(&mut self, env: &mut Shared<S>) {
        if !env.attached {
            return;
        }
        let needed = self.max_capacity(env).min(self.core.rows);
        let len = self.visual.len();
        let diff = needed as isize - len as isize;

        if diff > 0 {
            let grow = diff as usize;
            let next_last = if len > 0 { self.top + len } else { 0 };
            let content_fits = next_last + grow < self.core.rows;
            if content_fits {
                self.fill_and_populate(env, len, next_last, grow);
            } else {
                // Near the end: grow from the top and let the scroll position settle back.
                let old_scroll_top = env.layout.body_scroll_top;
                env.vertical.set_scroll_pos(0.0);
                self.on_vertical_scroll(env);
                let len = self.visual.len();
                self.fill_and_populate(env, len, self.top + len, grow);
                env.vertical.set_scroll_pos(old_scroll_top);
                self.on_vertical_scroll(env);
            }
        } else if diff < 0 {
            for _ in 0..diff.unsigned_abs() {
                if let Some(row) = self.visual.pop_back() {
                    let logical = self.top + self.visual.len();
                    self.core.detach_row(env, row, logical);
                }
            }
            if !self.visual.is_empty() {
                let first_top = self.row_top_at(env, 0);
                let min_top = env.layout.body_scroll_top - self.row_height();
                let next_last = self.top + self.visual.len();
                if first_top < min_top && next_last < self.core.rows {
                    let len = self.visual.len();
                    self.move_and_update_rows(env, Range::with_only(0), len, next_last);
                    self.set_top(self.top + 1);
                }
            }
        }

        if diff != 0 {
            vdebug!(diff, rendered = self.visual.len(), "verified body row count");
            self.fire_visibility(env);
        }
    }

    /// Re-applies the row height to rows and spacers, keeping the relative scroll position.
    pub(crate) fn reapply_default_row_heights<S: Surface>(&mut self, env: &mut Shared<S>) {
        let rh = self.row_height();
        for v in 0..self.visual.len() {
            self.core.reapply_row_height(env, &self.visual[v]);
            let y = self.row_top(self.top + v);
            self.set_row_position(env, v, y);
        }
        let spacers: Vec<(isize, ElementId, ElementId, f64)> = self
            .spacers
            .values()
            .map(|s| (s.row, s.root, s.deco, s.height()))
            .collect();
        for (row, root, deco, height) in spacers {
            let x = env.positions.left(root).unwrap_or(env.layout.body_scroll_left);
            let y = self.spacer_top(row);
            env.positions.set(&mut env.surface, root, x, y);
            env.positions.set(&mut env.surface, deco, 0.0, y - rh);
            env.surface.set_height(deco, height + rh);
        }
        if self.visual.is_empty() {
            return;
        }

        let scroll_size = env.vertical.scroll_size();
        let ratio = if scroll_size > 0.0 {
            env.vertical.scroll_pos() / scroll_size
        } else {
            0.0
        };
        self.recalculate_scrollbars(env);
        env.vertical
            .set_scroll_pos((self.content_height() * ratio).trunc());
        self.on_vertical_scroll(env);
        self.verify_escalator_count(env);
    }

    /// Reorders the surface children to the visual order, spacers interleaved.
    ///
    /// A focused row is never moved; everything else is placed around it.
    pub(crate) fn sort_dom_elements<S: Surface>(&mut self, env: &mut Shared<S>) {
        env.sorter.cancel();
        let mut ordered: Vec<ElementId> = Vec::with_capacity(self.visual.len() + 2);
        let mut shown: HashSet<isize> = HashSet::new();

        let above = self.top as isize - 1;
        if let Some(spacer) = self.spacers.get(above) {
            ordered.push(spacer.root);
            shown.insert(above);
        }
        for (v, row) in self.visual.iter().enumerate() {
            ordered.push(row.id);
            let logical = (self.top + v) as isize;
            if let Some(spacer) = self.spacers.get(logical) {
                ordered.push(spacer.root);
                shown.insert(logical);
            }
        }
        for spacer in self.spacers.values() {
            spacer.set_displayed(&mut env.surface, shown.contains(&spacer.row));
        }

        let focused = env
            .surface
            .focused_row(Section::Body)
            .filter(|f| ordered.contains(f));
        let mut insert_first = focused.is_none();
        for &element in ordered.iter().rev() {
            if Some(element) == focused {
                insert_first = true;
            } else if insert_first {
                env.surface.insert_after(Section::Body, element, None);
            } else {
                env.surface.insert_after(Section::Body, element, focused);
            }
        }
        vtrace!(elements = ordered.len(), "sorted body elements");
    }

    // ---- spacers ----

    pub(crate) fn spacer_exists(&self, row: isize) -> bool {
        self.spacers.exists(row) || self.detached_spacers.iter().any(|(r, _)| *r == row)
    }

    pub(crate) fn spacer_height(&self, row: isize) -> Option<f64> {
        self.spacers.get(row).map(Spacer::height).or_else(|| {
            self.detached_spacers
                .iter()
                .find(|(r, _)| *r == row)
                .map(|(_, h)| *h)
        })
    }

    pub(crate) fn spacer_handle(&self, row: isize) -> Option<SpacerHandle> {
        self.spacers.get(row).map(Spacer::handle)
    }

    /// Creates, resizes or (with a negative height) removes the spacer below `row`.
    pub(crate) fn set_spacer<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        row: isize,
        height: f64,
    ) -> Result<()> {
        if row < -1 || row >= self.core.rows as isize {
            return Err(EscalatorError::invalid(format!(
                "spacer row must be between -1 and {} (was {row})",
                self.core.rows as isize - 1
            )));
        }
        if height.is_nan() {
            return Err(EscalatorError::invalid("spacer height must be a number"));
        }

        if !env.attached {
            self.detached_spacers.retain(|(r, _)| *r != row);
            if height >= 0.0 {
                self.detached_spacers.push((row, height));
            }
            return Ok(());
        }

        if self.spacers.exists(row) {
            if height < 0.0 {
                self.remove_spacer(env, row);
            } else {
                self.set_spacer_height(env, row, height);
                self.update_spacer_visibility(env);
            }
        } else if height >= 0.0 {
            self.insert_new_spacer(env, row, height);
        }
        Ok(())
    }

    fn insert_new_spacer<S: Surface>(&mut self, env: &mut Shared<S>, row: isize, height: f64) {
        let root = env.ids.allocate();
        let content = env.ids.allocate();
        let deco = env.ids.allocate();
        env.surface.create_element(Section::Body, ElementKind::Spacer, root);
        env.surface
            .create_element(Section::Body, ElementKind::SpacerContent, content);
        env.surface
            .create_element(Section::Body, ElementKind::SpacerDecoration, deco);
        let spacer_style = env.class_name("spacer");
        let deco_style = env.class_name("spacer-deco");
        env.surface.set_style_name(root, &spacer_style);
        env.surface.set_style_name(deco, &deco_style);
        env.surface.set_width(root, env.layout.wrapper_width);

        let spacer = Spacer {
            row,
            root,
            content,
            deco,
            height: -1.0,
        };
        let x = env.layout.body_scroll_left;
        let y = self.spacer_top(row);
        spacer.set_position(&mut env.surface, &mut env.positions, x, y, self.row_height());
        let reference = self.visual.back().map(|r| r.id);
        env.surface.insert_after(Section::Body, root, reference);
        self.spacers.insert(spacer);
        vdebug!(row, height, "insert spacer");

        self.set_spacer_height(env, row, height);
        if let Some(handle) = self.spacer_handle(row) {
            self.spacer_updater.init(&handle);
        }
        self.update_spacer_visibility(env);
        self.sort_dom_elements(env);
    }

    fn set_spacer_height<S: Surface>(&mut self, env: &mut Shared<S>, row: isize, height: f64) {
        let Some(spacer) = self.spacers.get(row) else {
            return;
        };
        let (root, deco) = (spacer.root, spacer.deco);
        let old = spacer.height();
        let diff = height - old;
        let growing = diff > 0.0;
        let rh = self.row_height();

        self.spacers
            .shift_positions_after_row(&mut env.surface, &mut env.positions, row, diff, rh);
        if growing {
            env.vertical
                .set_scroll_size(env.vertical.scroll_size() + diff);
        }

        // Growing the -1 spacer at the very top pushes rows down instead of scrolling.
        let minus_one_exception = growing && row == -1 && self.top == 0;
        if row < self.top as isize && !minus_one_exception {
            for r in &self.visual {
                let y = env.positions.top(r.id).unwrap_or(0.0);
                env.positions.set(&mut env.surface, r.id, 0.0, y + diff);
            }
            let spacer_top = env.positions.top(root).unwrap_or(0.0);
            let spacer_bottom = spacer_top + old;
            let scroll_top = env.layout.body_scroll_top;
            let viewport_inside = spacer_top < scroll_top && scroll_top < spacer_bottom;
            let delta = if viewport_inside && !growing {
                diff.max(spacer_top - scroll_top)
            } else {
                diff
            };
            let delta = delta.max(-scroll_top);
            env.set_body_scroll_position(env.layout.body_scroll_left, scroll_top + delta);
            env.vertical.set_scroll_pos_by_delta(delta);
        } else {
            self.shift_row_positions(env, row, diff);
        }

        if !growing {
            env.vertical
                .set_scroll_size(env.vertical.scroll_size() + diff);
        }

        if let Some(spacer) = self.spacers.get_mut(row) {
            spacer.height = height;
        }
        env.surface.set_height(root, height);
        env.surface.set_height(deco, height + rh);
        vtrace!(row, old, height, "spacer height");
    }

    /// Moves the rendered rows after logical `row` by `diff` pixels.
    fn shift_row_positions<S: Surface>(&self, env: &mut Shared<S>, row: isize, diff: f64) {
        let visible = self.visible_row_range();
        if visible.is_empty() {
            return;
        }
        let from = if row < visible.start() as isize {
            0
        } else if row >= visible.end() as isize - 1 {
            return;
        } else {
            (row - visible.start() as isize + 1) as usize
        };
        for r in self.visual.range(from..) {
            let y = env.positions.top(r.id).unwrap_or(0.0);
            env.positions.set(&mut env.surface, r.id, 0.0, y + diff);
        }
    }

    fn remove_spacer<S: Surface>(&mut self, env: &mut Shared<S>, row: isize) {
        let Some(handle) = self.spacer_handle(row) else {
            return;
        };
        self.spacer_updater.destroy(&handle);
        self.set_spacer_height(env, row, 0.0);
        if let Some(spacer) = self.spacers.remove(row) {
            destroy_spacer_elements(env, &spacer);
        }
        vdebug!(row, "removed spacer");
    }

    /// Removes the spacers of `rows` and pulls the following spacers up by `rows.len()`.
    fn paint_remove_spacers<S: Surface>(&mut self, env: &mut Shared<S>, rows: Range) {
        for row in self
            .spacers
            .rows_between(rows.start() as isize, rows.end() as isize)
        {
            self.remove_spacer(env, row);
        }
        self.spacers.shift_by_rows(
            &mut env.surface,
            &mut env.positions,
            rows.start() as isize,
            -(rows.len() as isize),
            self.row_height(),
        );
    }

    /// Shows spacers that intersect the viewport and clips the decorations of those next to
    /// rendered rows.
    pub(crate) fn update_spacer_visibility<S: Surface>(&self, env: &mut Shared<S>) {
        if self.spacers.is_empty() {
            return;
        }
        let viewport_top = env.layout.body_scroll_top;
        let viewport_height = env.layout.body_height();
        let visible = self.visible_row_range();
        let near = (visible.start() as isize - 1)..(visible.end() as isize + 1);
        let rh = self.row_height();
        for spacer in self.spacers.values() {
            let displayed = !visible.is_empty()
                && self
                    .spacers
                    .is_in_viewport(&env.positions, spacer, viewport_top, viewport_height);
            env.surface.set_displayed(spacer.root, displayed);
            let deco_displayed = displayed && near.contains(&spacer.row);
            env.surface.set_displayed(spacer.deco, deco_displayed);
            if deco_displayed {
                let clip = SpacerStore::deco_clip(
                    &env.positions,
                    spacer,
                    rh,
                    viewport_top,
                    viewport_top + viewport_height,
                );
                env.surface.set_clip(spacer.deco, clip);
            }
        }
    }

    /// Places every spacer at horizontal offset `left`, keeping it under its row.
    pub(crate) fn set_spacers_left<S: Surface>(&self, env: &mut Shared<S>, left: f64) {
        for spacer in self.spacers.values() {
            let y = env.positions.top(spacer.root).unwrap_or(0.0);
            env.positions.set(&mut env.surface, spacer.root, left, y);
        }
    }

    pub(crate) fn reapply_spacer_widths<S: Surface>(&self, env: &mut Shared<S>) {
        for spacer in self.spacers.values() {
            env.surface.set_width(spacer.root, env.layout.wrapper_width);
        }
    }

    /// Replaces the spacer updater, tearing content down with the old one first.
    pub(crate) fn set_spacer_updater(&mut self, updater: BoxedSpacerUpdater) {
        for spacer in self.spacers.values() {
            self.spacer_updater.destroy(&spacer.handle());
        }
        self.spacer_updater = updater;
        for spacer in self.spacers.values() {
            self.spacer_updater.init(&spacer.handle());
        }
    }

    // ---- lifecycle ----

    pub(crate) fn attach<S: Surface>(&mut self, env: &mut Shared<S>) {
        self.verify_escalator_count(env);
        let remembered = std::mem::take(&mut self.detached_spacers);
        for (row, height) in remembered {
            if row < self.core.rows as isize {
                self.insert_new_spacer(env, row, height);
            }
        }
    }

    /// Destroys every pool row and spacer element; spacers are remembered for the next attach.
    pub(crate) fn detach<S: Surface>(&mut self, env: &mut Shared<S>) {
        for spacer in self.spacers.drain() {
            self.spacer_updater.destroy(&spacer.handle());
            self.detached_spacers.push((spacer.row, spacer.height()));
            destroy_spacer_elements(env, &spacer);
        }
        while let Some(row) = self.visual.pop_back() {
            let logical = self.top + self.visual.len();
            self.core.detach_row(env, row, logical);
        }
        self.top = 0;
    }
}

fn destroy_spacer_elements<S: Surface>(env: &mut Shared<S>, spacer: &Spacer) {
    env.surface.remove(Section::Body, spacer.root);
    for element in [spacer.content, spacer.deco, spacer.root] {
        env.positions.remove(element);
        env.surface.destroy_element(element);
    }
}

/// Reindexes remembered spacers at or after `index` by `delta` rows.
fn shift_remembered(spacers: &mut [(isize, f64)], index: isize, delta: isize) {
    for (row, _) in spacers.iter_mut() {
        if *row >= index {
            *row += delta;
        }
    }
}
