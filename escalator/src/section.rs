use crate::column::ColumnConfiguration;
use crate::flyweight::FlyweightRow;
use crate::options::VisibilityCallback;
use crate::sorter::DeferredSorter;
use crate::types::ElementIds;
use crate::updater::{BoxedRowUpdater, NullUpdater};
use crate::{
    ElementId, ElementKind, EscalatorError, PositionTracker, Range, Result, RowVisibility,
    ScrollbarBundle, Section, Surface,
};

/// Row height used until a real one is measured or set.
pub const DEFAULT_ROW_HEIGHT_PX: f64 = 20.0;

pub(crate) const FROZEN_CLASS: &str = "frozen";
pub(crate) const LAST_FROZEN_CLASS: &str = "last-frozen";

/// Sizes the escalator lays its sections out with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Layout {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) header_height: f64,
    pub(crate) footer_height: f64,
    /// Size of the area inside the scrollbars.
    pub(crate) wrapper_width: f64,
    pub(crate) wrapper_height: f64,
    pub(crate) body_scroll_top: f64,
    pub(crate) body_scroll_left: f64,
}

impl Layout {
    /// Height of the body viewport.
    pub(crate) fn body_height(&self) -> f64 {
        (self.wrapper_height - self.header_height - self.footer_height).max(0.0)
    }
}

/// State every section reads and writes: the surface, the position ledger, the columns and
/// the scrollbars.
pub(crate) struct Shared<S> {
    pub(crate) surface: S,
    pub(crate) positions: PositionTracker,
    pub(crate) columns: ColumnConfiguration,
    pub(crate) vertical: ScrollbarBundle,
    pub(crate) horizontal: ScrollbarBundle,
    pub(crate) layout: Layout,
    pub(crate) flyweight: FlyweightRow,
    pub(crate) sorter: DeferredSorter,
    pub(crate) ids: ElementIds,
    pub(crate) attached: bool,
    pub(crate) touching: bool,
    pub(crate) on_visibility: Option<VisibilityCallback>,
    pub(crate) style_name: String,
    /// Horizontal position frozen cells were last placed at.
    pub(crate) last_scroll_left: f64,
}

impl<S: Surface> Shared<S> {
    pub(crate) fn class_name(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.style_name)
    }

    pub(crate) fn set_body_scroll_position(&mut self, left: f64, top: f64) {
        self.layout.body_scroll_left = left;
        self.layout.body_scroll_top = top;
        self.surface.set_scroll_offset(Section::Body, left, top);
    }

    /// Restarts the deferred sort and asks the host for a frame.
    pub(crate) fn schedule_sort(&mut self) {
        let ticket = self.sorter.reschedule();
        self.surface.request_animation_frame(ticket);
    }

    pub(crate) fn fire_visibility(&self, visible: Range) {
        let Some(callback) = &self.on_visibility else {
            return;
        };
        let event = if visible.is_empty() {
            RowVisibility::default()
        } else {
            RowVisibility {
                first_visible_row: visible.start(),
                visible_row_count: visible.len(),
            }
        };
        callback(event);
    }

    fn bind(&mut self, row: &RowElement, logical: usize) {
        self.flyweight
            .setup(row.id, logical, &row.cells, self.columns.widths());
    }
}

/// A materialized row and its cells, in column order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RowElement {
    pub(crate) id: ElementId,
    pub(crate) cells: Vec<ElementId>,
}

/// Operations shared by the header, body and footer.
///
/// Indexes are logical row indexes. Mutations validate their arguments before touching any
/// state.
pub trait RowContainer {
    fn section(&self) -> Section;

    fn row_count(&self) -> usize;

    /// Inserts `count` rows at `index` (`0..=row_count`).
    fn insert_rows(&mut self, index: usize, count: usize) -> Result<()>;

    /// Removes the rows `index..index + count`.
    fn remove_rows(&mut self, index: usize, count: usize) -> Result<()>;

    /// Re-runs the updater on the rendered rows among `index..index + count`.
    fn refresh_rows(&mut self, index: usize, count: usize) -> Result<()>;

    fn default_row_height(&self) -> f64;

    /// Fixes the row height to `px` (at least one pixel) and stops auto-detection.
    fn set_default_row_height(&mut self, px: f64) -> Result<()>;

    /// Replaces the updater and refreshes every rendered row with it.
    fn set_updater(&mut self, updater: BoxedRowUpdater);

    /// The element currently showing logical row `index`.
    fn row_element(&self, index: usize) -> Result<ElementId>;
}

/// Bookkeeping and row painting common to every section.
pub(crate) struct SectionCore {
    pub(crate) section: Section,
    pub(crate) rows: usize,
    pub(crate) default_row_height: f64,
    pub(crate) autodetect: bool,
    pub(crate) updater: BoxedRowUpdater,
}

impl core::fmt::Debug for SectionCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SectionCore")
            .field("section", &self.section)
            .field("rows", &self.rows)
            .field("default_row_height", &self.default_row_height)
            .field("autodetect", &self.autodetect)
            .finish_non_exhaustive()
    }
}

impl SectionCore {
    pub(crate) fn new(section: Section, row_height: Option<f64>) -> Self {
        Self {
            section,
            rows: 0,
            default_row_height: row_height.map_or(DEFAULT_ROW_HEIGHT_PX, |h| h.max(1.0)),
            autodetect: row_height.is_none(),
            updater: Box::new(NullUpdater),
        }
    }

    pub(crate) fn validate_insert(&self, index: usize, count: usize) -> Result<()> {
        if index > self.rows {
            return Err(EscalatorError::out_of_bounds(index, 0, self.rows + 1));
        }
        if count < 1 {
            return Err(EscalatorError::invalid(format!(
                "number of rows must be 1 or greater (was {count})"
            )));
        }
        Ok(())
    }

    /// Checks `index..index + count` against the current rows.
    pub(crate) fn validate_range(&self, index: usize, count: usize) -> Result<()> {
        if count < 1 {
            return Err(EscalatorError::invalid(format!(
                "number of rows must be 1 or greater (was {count})"
            )));
        }
        let end = index.checked_add(count).unwrap_or(usize::MAX);
        if end > self.rows {
            let bad = if index >= self.rows { index } else { end - 1 };
            return Err(EscalatorError::out_of_bounds(bad, 0, self.rows));
        }
        Ok(())
    }

    pub(crate) fn validate_row_height(px: f64) -> Result<()> {
        if px.is_nan() || px < 1.0 {
            return Err(EscalatorError::invalid(format!(
                "row height must be at least 1px (was {px})"
            )));
        }
        Ok(())
    }

    /// Creates an unattached row with one cell per column.
    pub(crate) fn create_row<S: Surface>(&self, env: &mut Shared<S>) -> RowElement {
        let id = env.ids.allocate();
        env.surface.create_element(self.section, ElementKind::Row, id);
        let style = env.class_name("row");
        env.surface.set_style_name(id, &style);
        let mut row = RowElement {
            id,
            cells: Vec::with_capacity(env.columns.column_count()),
        };
        for column in 0..env.columns.column_count() {
            let cell = self.create_cell(env, column);
            env.surface.insert_cell(id, cell, column);
            row.cells.push(cell);
        }
        env.surface.set_width(id, env.columns.row_width());
        row
    }

    fn create_cell<S: Surface>(&self, env: &mut Shared<S>, column: usize) -> ElementId {
        let cell = env.ids.allocate();
        env.surface.create_element(self.section, ElementKind::Cell, cell);
        let style = env.class_name("cell");
        env.surface.set_style_name(cell, &style);
        let width = env.columns.widths().get(column).copied().unwrap_or(-1.0);
        if width >= 0.0 {
            env.surface.set_width(cell, width);
        }
        env.surface.set_height(cell, self.default_row_height);
        let frozen = env.columns.frozen_column_count();
        if column < frozen {
            env.surface.set_class(cell, FROZEN_CLASS, true);
            let left = env.last_scroll_left;
            env.positions.set(&mut env.surface, cell, left, 0.0);
            if column + 1 == frozen {
                env.surface.set_class(cell, LAST_FROZEN_CLASS, true);
            }
        }
        cell
    }

    /// Runs the attach hooks around inserting `row` after `reference`.
    pub(crate) fn attach_row<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        row: &RowElement,
        logical: usize,
        reference: Option<ElementId>,
    ) {
        env.bind(row, logical);
        self.updater
            .pre_attach(&env.flyweight, env.flyweight.cells());
        env.surface.insert_after(self.section, row.id, reference);
        self.updater
            .post_attach(&env.flyweight, env.flyweight.cells());
        self.updater.update(&env.flyweight, env.flyweight.cells());
        env.flyweight.teardown();
    }

    /// Runs the detach hooks around removing `row`, then destroys its elements.
    pub(crate) fn detach_row<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        row: RowElement,
        logical: usize,
    ) {
        env.bind(&row, logical);
        self.updater
            .pre_detach(&env.flyweight, env.flyweight.cells());
        env.surface.remove(self.section, row.id);
        self.updater
            .post_detach(&env.flyweight, env.flyweight.cells());
        env.flyweight.teardown();
        for cell in row.cells {
            env.positions.remove(cell);
            env.surface.destroy_element(cell);
        }
        env.positions.remove(row.id);
        env.surface.destroy_element(row.id);
    }

    /// Calls `update` for the cells of `columns`.
    pub(crate) fn refresh_row<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        row: &RowElement,
        logical: usize,
        columns: Range,
    ) {
        env.bind(row, logical);
        self.updater
            .update(&env.flyweight, env.flyweight.cells_in(columns));
        env.flyweight.teardown();
    }

    /// Creates the cells of freshly inserted columns `index..index + count` in `row`.
    ///
    /// The column model must already contain the new columns.
    pub(crate) fn insert_cells<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        row: &mut RowElement,
        logical: usize,
        index: usize,
        count: usize,
    ) {
        let created: Vec<ElementId> = (index..index + count)
            .map(|column| self.create_cell(env, column))
            .collect();
        row.cells.splice(index..index, created.iter().copied());
        let columns = Range::with_length(index, count);

        env.bind(row, logical);
        self.updater
            .pre_attach(&env.flyweight, env.flyweight.cells_in(columns));
        for (offset, cell) in created.iter().enumerate() {
            env.surface.insert_cell(row.id, *cell, index + offset);
        }
        self.updater
            .post_attach(&env.flyweight, env.flyweight.cells_in(columns));
        self.updater
            .update(&env.flyweight, env.flyweight.cells_in(columns));
        env.flyweight.teardown();
    }

    /// Detaches and destroys the cells of `columns` in `row`.
    ///
    /// The column model must still contain the removed columns.
    pub(crate) fn remove_cells<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        row: &mut RowElement,
        logical: usize,
        columns: Range,
    ) {
        env.bind(row, logical);
        self.updater
            .pre_detach(&env.flyweight, env.flyweight.cells_in(columns));
        for cell in &row.cells[columns.start()..columns.end()] {
            env.surface.remove_cell(row.id, *cell);
        }
        self.updater
            .post_detach(&env.flyweight, env.flyweight.cells_in(columns));
        env.flyweight.teardown();

        for cell in row.cells.drain(columns.start()..columns.end()) {
            env.positions.remove(cell);
            env.surface.destroy_element(cell);
        }
    }

    pub(crate) fn reapply_row_height<S: Surface>(&self, env: &mut Shared<S>, row: &RowElement) {
        for cell in &row.cells {
            env.surface.set_height(*cell, self.default_row_height);
        }
    }

    pub(crate) fn reapply_column_width<S: Surface>(
        env: &mut Shared<S>,
        row: &RowElement,
        column: usize,
    ) {
        let width = env.columns.widths().get(column).copied().unwrap_or(-1.0);
        if width < 0.0 {
            return;
        }
        if let Some(cell) = row.cells.get(column) {
            env.surface.set_width(*cell, width);
        }
    }

    pub(crate) fn reapply_row_width<S: Surface>(env: &mut Shared<S>, row: &RowElement) {
        env.surface.set_width(row.id, env.columns.row_width());
    }

    /// Moves the frozen cells of `row` to the horizontal scroll position.
    pub(crate) fn update_freeze_position<S: Surface>(
        env: &mut Shared<S>,
        row: &RowElement,
        scroll_left: f64,
    ) {
        let frozen = env.columns.frozen_column_count().min(row.cells.len());
        for cell in &row.cells[..frozen] {
            env.positions.set(&mut env.surface, *cell, scroll_left, 0.0);
        }
    }

    /// Moves the frozen boundary of `row` from `old` to `new` frozen columns.
    pub(crate) fn update_frozen_columns<S: Surface>(
        env: &mut Shared<S>,
        row: &RowElement,
        old: usize,
        new: usize,
    ) {
        if let Some(cell) = old.checked_sub(1).and_then(|i| row.cells.get(i)) {
            env.surface.set_class(*cell, LAST_FROZEN_CLASS, false);
        }
        if let Some(cell) = new.checked_sub(1).and_then(|i| row.cells.get(i)) {
            env.surface.set_class(*cell, LAST_FROZEN_CLASS, true);
        }
        let left = env.last_scroll_left;
        if new > old {
            for cell in &row.cells[old..new.min(row.cells.len())] {
                env.surface.set_class(*cell, FROZEN_CLASS, true);
                env.positions.set(&mut env.surface, *cell, left, 0.0);
            }
        } else {
            for cell in &row.cells[new..old.min(row.cells.len())] {
                env.surface.set_class(*cell, FROZEN_CLASS, false);
                env.positions.reset(&mut env.surface, *cell);
            }
        }
    }

    /// Widest content of `column` among `rows`.
    pub(crate) fn measure_column<'a, S: Surface>(
        &self,
        env: &Shared<S>,
        rows: impl IntoIterator<Item = &'a RowElement>,
        column: usize,
    ) -> f64 {
        rows.into_iter()
            .filter_map(|row| row.cells.get(column))
            .map(|cell| env.surface.measure_cell_width(self.section, column, *cell))
            .fold(0.0, f64::max)
    }

    /// Measures the section's row height when auto-detection is on. Returns whether it changed.
    pub(crate) fn detect_row_height<S: Surface>(&mut self, env: &Shared<S>) -> bool {
        if !self.autodetect {
            return false;
        }
        let Some(measured) = env.surface.measure_row_height(self.section) else {
            return false;
        };
        let height = measured.max(1.0);
        if height == self.default_row_height {
            return false;
        }
        vdebug!(section = ?self.section, height, "detected row height");
        self.default_row_height = height;
        true
    }
}
