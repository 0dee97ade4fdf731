use crate::body::BodySection;
use crate::flyweight::FlyweightRow;
use crate::scroller::{self, WheelDeltaMode};
use crate::section::{Layout, LAST_FROZEN_CLASS, RowContainer, RowElement, SectionCore, Shared};
use crate::sorter::{DeferredSorter, SortStep};
use crate::static_section::StaticSection;
use crate::types::ElementIds;
use crate::{
    BoxedRowUpdater, BoxedSpacerUpdater, CellRef, ColumnConfiguration, DEFAULT_COLUMN_WIDTH_PX,
    Direction, ElementId, EscalatorError, EscalatorOptions, FrameTicket, HeightMode,
    PositionTracker, Range, Result, ScrollDestination, ScrollState, ScrollbarBundle, Section,
    SpacerHandle, SpacerInclusion, Surface, VisibilityCallback,
};

/// Upper bound on scroll/visibility settling passes after one operation.
const MAX_SETTLE_PASSES: usize = 8;

/// A virtualized grid: a header, a virtualized body and a footer sharing one set of columns.
///
/// The escalator never holds UI objects. It drives a [`Surface`] with element-level commands
/// and keeps only as many body rows materialized as fit the viewport, rebinding them to new
/// logical rows as the user scrolls.
///
/// The host drives it with:
/// - [`Escalator::attach`] / [`Escalator::detach`] for the lifecycle,
/// - [`Escalator::set_size`] when the outer size changes,
/// - [`Escalator::set_scroll_top`] / [`Escalator::on_wheel`] for scrolling,
/// - [`Escalator::on_animation_frame`] for every frame requested through
///   [`Surface::request_animation_frame`].
///
/// Touch inertia and smooth scrolling live in the `escalator-adapter` crate.
pub struct Escalator<S: Surface> {
    env: Shared<S>,
    header: StaticSection,
    body: BodySection,
    footer: StaticSection,
    height_mode: HeightMode,
    height_by_rows: f64,
    /// Height requested by the host, used in [`HeightMode::Css`].
    css_height: f64,
    applying_height_by_rows: bool,
    batch_depth: usize,
}

impl<S: Surface> core::fmt::Debug for Escalator<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Escalator")
            .field("attached", &self.env.attached)
            .field("layout", &self.env.layout)
            .field("columns", &self.env.columns)
            .field("header", &self.header)
            .field("body", &self.body)
            .field("footer", &self.footer)
            .field("height_mode", &self.height_mode)
            .field("height_by_rows", &self.height_by_rows)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Escalator<S> {
    pub fn new(surface: S, options: EscalatorOptions) -> Self {
        vdebug!(
            width = options.width,
            height = options.height,
            height_mode = ?options.height_mode,
            "Escalator::new"
        );
        let thickness = options.scrollbar_thickness.max(0.0);
        let height_by_rows = if options.height_by_rows > 0.0 && options.height_by_rows.is_finite()
        {
            options.height_by_rows
        } else {
            vwarn!(rows = options.height_by_rows, "invalid height by rows, using 10");
            10.0
        };
        let env = Shared {
            surface,
            positions: PositionTracker::new(),
            columns: ColumnConfiguration::new(),
            vertical: ScrollbarBundle::new(Direction::Vertical, thickness),
            horizontal: ScrollbarBundle::new(Direction::Horizontal, thickness),
            layout: Layout {
                width: options.width.max(0.0),
                height: options.height.max(0.0),
                ..Layout::default()
            },
            flyweight: FlyweightRow::new(),
            sorter: DeferredSorter::new(options.sort_delay_ms, options.sort_frames),
            ids: ElementIds::default(),
            attached: false,
            touching: false,
            on_visibility: options.on_row_visibility_change,
            style_name: options.style_name,
            last_scroll_left: 0.0,
        };
        let mut escalator = Self {
            env,
            header: StaticSection::new(Section::Header, options.header_row_height),
            body: BodySection::new(options.body_row_height),
            footer: StaticSection::new(Section::Footer, options.footer_row_height),
            height_mode: options.height_mode,
            height_by_rows,
            css_height: options.height.max(0.0),
            applying_height_by_rows: false,
            batch_depth: 0,
        };
        escalator.recalculate_element_sizes();
        escalator.apply_height_by_rows();
        escalator.flush();
        escalator
    }

    pub fn surface(&self) -> &S {
        &self.env.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.env.surface
    }

    /// Detaches (destroying every element on the surface) and returns the surface.
    pub fn into_surface(mut self) -> S {
        self.detach();
        self.env.surface
    }

    /// Runs `f` and settles scroll state once at the end instead of after every operation.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        self.batch_depth += 1;
        f(self);
        self.batch_depth -= 1;
        self.flush();
    }

    // ---- lifecycle ----

    pub fn is_attached(&self) -> bool {
        self.env.attached
    }

    /// Materializes every section on the surface.
    ///
    /// Row heights of auto-detecting sections are measured first, then postponed column
    /// measurements are taken from the fresh rows.
    pub fn attach(&mut self) {
        if self.env.attached {
            return;
        }
        vdebug!("Escalator::attach");
        self.env.attached = true;
        self.header.core.detect_row_height(&self.env);
        self.body.core.detect_row_height(&self.env);
        self.footer.core.detect_row_height(&self.env);

        self.header.attach(&mut self.env);
        self.footer.attach(&mut self.env);
        self.sync_section_heights();
        self.body.recalculate_scrollbars(&mut self.env);
        self.body.attach(&mut self.env);

        let pending = self.env.columns.pending_measurements();
        if !pending.is_empty() {
            for &column in &pending {
                self.measure_column(column);
            }
            self.reapply_column_widths(&pending);
        }

        self.recalculate_element_sizes();
        self.apply_height_by_rows();
        self.on_scroll();
        self.flush();
    }

    /// Removes every element from the surface. Row counts, columns and spacers are kept.
    pub fn detach(&mut self) {
        if !self.env.attached {
            return;
        }
        vdebug!("Escalator::detach");
        self.body.detach(&mut self.env);
        self.header.detach(&mut self.env);
        self.footer.detach(&mut self.env);
        self.env.positions.clear();
        self.env.sorter.cancel();
        self.env.attached = false;
        self.env.touching = false;
        self.env.layout.header_height = 0.0;
        self.env.layout.footer_height = 0.0;
    }

    // ---- sizing ----

    pub fn width(&self) -> f64 {
        self.env.layout.width
    }

    pub fn height(&self) -> f64 {
        self.env.layout.height
    }

    /// Width inside the vertical scrollbar.
    pub fn inner_width(&self) -> f64 {
        self.env.layout.wrapper_width
    }

    /// Height of the body viewport.
    pub fn body_height(&self) -> f64 {
        self.env.layout.body_height()
    }

    /// Sets the outer size. In [`HeightMode::Row`] the height is remembered but the rows
    /// decide the actual height.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.env.layout.width = width.max(0.0);
        self.css_height = height.max(0.0);
        if self.height_mode == HeightMode::Css {
            self.env.layout.height = self.css_height;
        }
        self.recalculate_element_sizes();
        self.apply_height_by_rows();
        self.flush();
    }

    pub fn set_width(&mut self, width: f64) {
        self.set_size(width, self.css_height);
    }

    pub fn set_height(&mut self, height: f64) {
        self.set_size(self.env.layout.width, height);
    }

    pub fn set_scrollbar_thickness(&mut self, px: f64) {
        let px = px.max(0.0);
        self.env.vertical.set_thickness(px);
        self.env.horizontal.set_thickness(px);
        self.recalculate_element_sizes();
        self.flush();
    }

    pub fn height_mode(&self) -> HeightMode {
        self.height_mode
    }

    pub fn set_height_mode(&mut self, mode: HeightMode) {
        if mode == self.height_mode {
            return;
        }
        vdebug!(?mode, "height mode");
        self.height_mode = mode;
        match mode {
            HeightMode::Css => self.set_height_internal(self.css_height),
            HeightMode::Row => self.apply_height_by_rows(),
        }
        self.flush();
    }

    pub fn height_by_rows(&self) -> f64 {
        self.height_by_rows
    }

    /// Sets how many body rows the escalator shows in [`HeightMode::Row`].
    pub fn set_height_by_rows(&mut self, rows: f64) -> Result<()> {
        if rows.is_nan() || rows <= 0.0 {
            return Err(EscalatorError::invalid(format!(
                "height by rows must be greater than 0 (was {rows})"
            )));
        }
        if rows.is_infinite() {
            return Err(EscalatorError::invalid(format!(
                "height by rows must be finite (was {rows})"
            )));
        }
        self.height_by_rows = rows;
        self.apply_height_by_rows();
        self.flush();
        Ok(())
    }

    pub fn style_name(&self) -> &str {
        &self.env.style_name
    }

    /// Changes the style prefix and re-applies it to every row, cell and spacer.
    pub fn set_style_name(&mut self, style_name: impl Into<String>) {
        self.env.style_name = style_name.into();
        let row_style = self.env.class_name("row");
        let cell_style = self.env.class_name("cell");
        self.for_each_row(|_, env, row, _| {
            env.surface.set_style_name(row.id, &row_style);
            for cell in &row.cells {
                env.surface.set_style_name(*cell, &cell_style);
            }
        });
        let spacer_style = self.env.class_name("spacer");
        let deco_style = self.env.class_name("spacer-deco");
        for spacer in self.body.spacers.values() {
            self.env.surface.set_style_name(spacer.root, &spacer_style);
            self.env.surface.set_style_name(spacer.deco, &deco_style);
        }
    }

    pub fn set_row_visibility_callback(&mut self, callback: Option<VisibilityCallback>) {
        self.env.on_visibility = callback;
    }

    // ---- sections ----

    pub fn header(&mut self) -> StaticSectionMut<'_, S> {
        StaticSectionMut {
            escalator: self,
            section: Section::Header,
        }
    }

    pub fn footer(&mut self) -> StaticSectionMut<'_, S> {
        StaticSectionMut {
            escalator: self,
            section: Section::Footer,
        }
    }

    pub fn body(&mut self) -> BodyMut<'_, S> {
        BodyMut { escalator: self }
    }

    pub fn row_count(&self, section: Section) -> usize {
        match section {
            Section::Header => self.header.row_count(),
            Section::Body => self.body.row_count(),
            Section::Footer => self.footer.row_count(),
        }
    }

    pub fn default_row_height(&self, section: Section) -> f64 {
        match section {
            Section::Header => self.header.core.default_row_height,
            Section::Body => self.body.row_height(),
            Section::Footer => self.footer.core.default_row_height,
        }
    }

    /// The section that rendered `element` (a row or a cell).
    pub fn find_section(&self, element: ElementId) -> Option<Section> {
        self.cell_for(element)
            .map(|cell| cell.section)
            .or_else(|| self.row_ref(element).map(|(section, _)| section))
    }

    /// Locates a rendered cell by its element.
    pub fn cell_for(&self, element: ElementId) -> Option<CellRef> {
        let top = self.body.top_row_index();
        find_cell(Section::Header, element, self.header.elements().iter().enumerate())
            .or_else(|| {
                let body = self.body.elements().enumerate().map(|(v, r)| (top + v, r));
                find_cell(Section::Body, element, body)
            })
            .or_else(|| {
                find_cell(Section::Footer, element, self.footer.elements().iter().enumerate())
            })
    }

    fn row_ref(&self, element: ElementId) -> Option<(Section, usize)> {
        if let Some(i) = self.header.elements().iter().position(|r| r.id == element) {
            return Some((Section::Header, i));
        }
        if let Some(v) = self.body.elements().position(|r| r.id == element) {
            return Some((Section::Body, self.body.top_row_index() + v));
        }
        self.footer
            .elements()
            .iter()
            .position(|r| r.id == element)
            .map(|i| (Section::Footer, i))
    }

    fn insert_rows(&mut self, section: Section, index: usize, count: usize) -> Result<()> {
        match section {
            Section::Body => self.body.insert_rows(&mut self.env, index, count)?,
            _ => {
                let (static_section, env) = self.static_parts(section);
                static_section.insert_rows(env, index, count)?;
                self.on_static_section_changed(false);
            }
        }
        if self.env.attached && self.row_count(section) == count {
            // First rows in the section: give every column its width.
            let widths: Vec<(usize, f64)> = (0..self.env.columns.column_count())
                .map(|i| (i, self.env.columns.column_width(i).unwrap_or(-1.0)))
                .collect();
            self.apply_column_widths(&widths);
        }
        self.flush();
        Ok(())
    }

    fn remove_rows(&mut self, section: Section, index: usize, count: usize) -> Result<()> {
        match section {
            Section::Body => self.body.remove_rows(&mut self.env, index, count)?,
            _ => {
                let (static_section, env) = self.static_parts(section);
                static_section.remove_rows(env, index, count)?;
                self.on_static_section_changed(true);
            }
        }
        self.flush();
        Ok(())
    }

    fn refresh_rows(&mut self, section: Section, index: usize, count: usize) -> Result<()> {
        match section {
            Section::Body => self.body.refresh_rows(&mut self.env, index, count),
            _ => {
                let (static_section, env) = self.static_parts(section);
                static_section.refresh_rows(env, index, count)
            }
        }
    }

    fn set_default_row_height(&mut self, section: Section, px: f64) -> Result<()> {
        SectionCore::validate_row_height(px)?;
        vdebug!(?section, px, "default row height");
        match section {
            Section::Body => {
                self.body.core.autodetect = false;
                self.body.core.default_row_height = px;
                if self.env.attached {
                    self.body.reapply_default_row_heights(&mut self.env);
                }
                self.recalculate_element_sizes();
                self.apply_height_by_rows();
            }
            _ => {
                let (static_section, env) = self.static_parts(section);
                static_section.core.autodetect = false;
                static_section.core.default_row_height = px;
                if env.attached {
                    static_section.reapply_default_row_heights(env);
                }
                self.on_static_section_changed(true);
            }
        }
        self.flush();
        Ok(())
    }

    fn set_updater(&mut self, section: Section, updater: BoxedRowUpdater) {
        match section {
            Section::Body => self.body.set_updater(&mut self.env, updater),
            _ => {
                let (static_section, env) = self.static_parts(section);
                static_section.set_updater(env, updater);
            }
        }
    }

    fn row_element(&self, section: Section, index: usize) -> Result<ElementId> {
        match section {
            Section::Header => self.header.row_element(index),
            Section::Body => self.body.row_element(index),
            Section::Footer => self.footer.row_element(index),
        }
    }

    fn static_parts(&mut self, section: Section) -> (&mut StaticSection, &mut Shared<S>) {
        let static_section = match section {
            Section::Header => &mut self.header,
            _ => &mut self.footer,
        };
        (static_section, &mut self.env)
    }

    /// Re-lays the escalator out after a header or footer changed height.
    fn on_static_section_changed(&mut self, keep_scroll: bool) {
        let scroll_top = self.env.vertical.scroll_pos();
        self.recalculate_element_sizes();
        self.apply_height_by_rows();
        if keep_scroll {
            self.env.vertical.set_scroll_pos(scroll_top);
        }
    }

    // ---- columns ----

    pub fn columns(&self) -> &ColumnConfiguration {
        &self.env.columns
    }

    /// Inserts `count` columns at `index` into every section.
    ///
    /// Columns inserted left of the viewport push the horizontal scroll position right by
    /// their width, so the visible content stays put.
    pub fn insert_columns(&mut self, index: usize, count: usize) -> Result<()> {
        let columns = self.env.columns.column_count();
        if index > columns {
            return Err(EscalatorError::out_of_bounds(index, 0, columns + 1));
        }
        if count < 1 {
            return Err(EscalatorError::invalid(format!(
                "number of columns must be 1 or greater (was {count})"
            )));
        }
        vdebug!(index, count, "insert columns");
        self.env.columns.insert(index, count);
        if self.has_rows() {
            for column in index..index + count {
                self.env
                    .columns
                    .define_width(column, DEFAULT_COLUMN_WIDTH_PX, self.env.attached);
            }
        }
        if self.env.attached {
            self.for_each_row(|core, env, row, logical| {
                core.insert_cells(env, row, logical, index, count);
                SectionCore::reapply_row_width(env, row);
            });
        }
        self.recalculate_element_sizes();

        let left_of_inserted = self
            .env
            .columns
            .calculated_columns_width(Range::with_length(0, index));
        let scroll_left = self.env.last_scroll_left;
        if scroll_left > left_of_inserted {
            let inserted = self
                .env
                .columns
                .calculated_columns_width(Range::with_length(index, count));
            self.env.horizontal.set_scroll_pos(scroll_left + inserted);
        }
        self.flush();
        Ok(())
    }

    pub fn remove_columns(&mut self, index: usize, count: usize) -> Result<()> {
        let columns = self.env.columns.column_count();
        if count < 1 {
            return Err(EscalatorError::invalid(format!(
                "number of columns must be 1 or greater (was {count})"
            )));
        }
        let end = index.saturating_add(count);
        if end > columns {
            let bad = if index >= columns { index } else { end - 1 };
            return Err(EscalatorError::out_of_bounds(bad, 0, columns));
        }
        vdebug!(index, count, "remove columns");
        let removed = Range::with_length(index, count);

        let horizontal = &self.env.horizontal;
        if horizontal.offset_size() < horizontal.scroll_size() {
            let left_of_removed = self
                .env
                .columns
                .calculated_columns_width(Range::with_length(0, index));
            let removed_width = self.env.columns.calculated_columns_width(removed);
            let scroll_left = self.env.horizontal.scroll_pos();
            if scroll_left > left_of_removed {
                self.env
                    .horizontal
                    .set_scroll_pos(left_of_removed.max(scroll_left - removed_width));
            }
        }

        if self.env.attached {
            self.for_each_row(|core, env, row, logical| {
                core.remove_cells(env, row, logical, removed);
            });
        }
        let old_frozen = self.env.columns.frozen_column_count();
        self.env.columns.remove(index, count);
        let new_frozen = self.env.columns.frozen_column_count();
        self.for_each_row(|_, env, row, _| {
            if old_frozen != new_frozen && new_frozen > 0 {
                if let Some(cell) = row.cells.get(new_frozen - 1) {
                    env.surface.set_class(*cell, LAST_FROZEN_CLASS, true);
                }
            }
            SectionCore::reapply_row_width(env, row);
        });
        self.recalculate_element_sizes();
        self.flush();
        Ok(())
    }

    /// Re-runs the updaters on the cells of `index..index + count` in every rendered row.
    pub fn refresh_columns(&mut self, index: usize, count: usize) -> Result<()> {
        let columns = self.env.columns.column_count();
        if count < 1 {
            return Err(EscalatorError::invalid(format!(
                "number of columns must be 1 or greater (was {count})"
            )));
        }
        let range = Range::with_length(index, count);
        if !range.is_subset_of(&Range::with_length(0, columns)) {
            return Err(EscalatorError::out_of_bounds(
                index.max(columns.min(range.end() - 1)),
                0,
                columns,
            ));
        }
        let all_header = Range::with_length(0, self.header.row_count());
        let all_footer = Range::with_length(0, self.footer.row_count());
        self.header.refresh_cells(&mut self.env, all_header, range);
        self.footer.refresh_cells(&mut self.env, all_footer, range);
        let visible = self.body.visible_row_range();
        self.body.refresh_cells(&mut self.env, visible, range);
        Ok(())
    }

    pub fn set_frozen_column_count(&mut self, count: usize) -> Result<()> {
        let columns = self.env.columns.column_count();
        if count > columns {
            return Err(EscalatorError::invalid(format!(
                "frozen column count {count} exceeds the column count {columns}"
            )));
        }
        let old = self.env.columns.frozen_column_count();
        if old == count {
            return Ok(());
        }
        vdebug!(old, count, "frozen columns");
        self.env.columns.set_frozen(count);
        self.for_each_row(|_, env, row, _| SectionCore::update_frozen_columns(env, row, old, count));
        self.recalculate_element_sizes();
        self.flush();
        Ok(())
    }

    /// Sets a column width. A negative width measures the column from its content.
    pub fn set_column_width(&mut self, index: usize, px: f64) -> Result<()> {
        self.set_column_widths(&[(index, px)])
    }

    /// Sets several column widths at once; all indexes are validated first.
    pub fn set_column_widths(&mut self, widths: &[(usize, f64)]) -> Result<()> {
        for &(index, px) in widths {
            self.env.columns.check_index(index)?;
            if px.is_nan() {
                return Err(EscalatorError::invalid(format!(
                    "width of column {index} must be a number"
                )));
            }
        }
        if widths.is_empty() {
            return Ok(());
        }
        self.apply_column_widths(widths);
        self.flush();
        Ok(())
    }

    fn apply_column_widths(&mut self, widths: &[(usize, f64)]) {
        let mut touched = Vec::with_capacity(widths.len());
        for &(index, px) in widths {
            let px = if px >= 0.0 { px.floor() } else { px };
            vtrace!(index, px, "column width");
            if self
                .env
                .columns
                .define_width(index, px, self.env.attached)
            {
                self.measure_column(index);
            }
            touched.push(index);
        }
        self.reapply_column_widths(&touched);
        self.recalculate_element_sizes();
    }

    fn reapply_column_widths(&mut self, columns: &[usize]) {
        self.for_each_row(|_, env, row, _| {
            for &column in columns {
                SectionCore::reapply_column_width(env, row, column);
            }
            SectionCore::reapply_row_width(env, row);
        });
    }

    /// Measures `column` across every rendered row of every section.
    fn measure_column(&mut self, column: usize) {
        let env = &self.env;
        let width = self
            .header
            .core
            .measure_column(env, self.header.elements(), column)
            .max(self.body.core.measure_column(env, self.body.elements(), column))
            .max(
                self.footer
                    .core
                    .measure_column(env, self.footer.elements(), column),
            );
        vtrace!(column, width, "measured column");
        self.env.columns.set_measured(column, width);
    }

    fn has_rows(&self) -> bool {
        self.header.row_count() > 0 || self.body.row_count() > 0 || self.footer.row_count() > 0
    }

    // ---- scrolling ----

    pub fn scroll_top(&self) -> f64 {
        self.env.vertical.scroll_pos()
    }

    pub fn scroll_left(&self) -> f64 {
        self.env.horizontal.scroll_pos()
    }

    pub fn set_scroll_top(&mut self, px: f64) {
        self.env.vertical.set_scroll_pos(px);
        self.flush();
    }

    pub fn set_scroll_left(&mut self, px: f64) {
        self.env.horizontal.set_scroll_pos(px);
        self.flush();
    }

    pub fn scroll_state(&self) -> ScrollState {
        ScrollState {
            scroll_top: self.scroll_top(),
            scroll_left: self.scroll_left(),
        }
    }

    pub fn restore_scroll_state(&mut self, state: ScrollState) {
        self.env.vertical.set_scroll_pos(state.scroll_top);
        self.env.horizontal.set_scroll_pos(state.scroll_left);
        self.flush();
    }

    pub fn vertical_scrollbar(&self) -> &ScrollbarBundle {
        &self.env.vertical
    }

    pub fn horizontal_scrollbar(&self) -> &ScrollbarBundle {
        &self.env.horizontal
    }

    pub fn set_scroll_locked(&mut self, direction: Direction, locked: bool) {
        self.scrollbar_mut(direction).set_locked(locked);
    }

    pub fn is_scroll_locked(&self, direction: Direction) -> bool {
        match direction {
            Direction::Vertical => self.env.vertical.is_locked(),
            Direction::Horizontal => self.env.horizontal.is_locked(),
        }
    }

    fn scrollbar_mut(&mut self, direction: Direction) -> &mut ScrollbarBundle {
        match direction {
            Direction::Vertical => &mut self.env.vertical,
            Direction::Horizontal => &mut self.env.horizontal,
        }
    }

    /// Scrolls so body row `row` is placed according to `destination`.
    pub fn scroll_to_row(
        &mut self,
        row: usize,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<()> {
        let pos = self.scroll_to_row_offset(row, destination, padding)?;
        self.env.vertical.set_scroll_pos(pos);
        self.flush();
        Ok(())
    }

    /// The clamped `scroll_top` that [`Escalator::scroll_to_row`] would apply, without
    /// scrolling.
    pub fn scroll_to_row_offset(
        &self,
        row: usize,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<f64> {
        let rows = self.body.row_count();
        if row >= rows {
            return Err(EscalatorError::out_of_bounds(row, 0, rows));
        }
        let top = self.body.row_top(row);
        let bottom = top + self.body.row_height();
        self.vertical_target(top, bottom, destination, padding)
    }

    /// Scrolls so the spacer below `row` (`-1` for the one above the first row) is placed
    /// according to `destination`.
    pub fn scroll_to_spacer(
        &mut self,
        row: isize,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<()> {
        let Some(height) = self.body.spacers.get(row).map(|s| s.height()) else {
            return Err(EscalatorError::invalid(format!(
                "no spacer is rendered for row {row}"
            )));
        };
        let top = self.body.spacer_top(row);
        self.scroll_vertically_to(top, top + height, destination, padding)
    }

    /// Scrolls so both body row `row` and its spacer are placed according to `destination`.
    ///
    /// With `row == -1` only the spacer above the first row is targeted, and it must exist.
    pub fn scroll_to_row_and_spacer(
        &mut self,
        row: isize,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<()> {
        if destination == ScrollDestination::Middle && padding != 0.0 {
            return Err(EscalatorError::invalid(format!(
                "padding must be zero when scrolling to the middle (was {padding})"
            )));
        }
        let rows = self.body.row_count();
        if row < -1 || row >= rows as isize {
            return Err(EscalatorError::IndexOutOfBounds {
                index: row,
                start: 0,
                end: rows,
            });
        }
        let spacer = self.body.spacers.get(row).map(|s| s.height());
        if row == -1 && spacer.is_none() {
            return Err(EscalatorError::invalid(
                "row -1 has no spacer to scroll to",
            ));
        }

        let row_range = if row >= 0 {
            let top = self.body.row_top(row as usize);
            Range::with_length(top.floor() as usize, self.body.row_height().ceil() as usize)
        } else {
            Range::empty()
        };
        let spacer_range = match spacer {
            Some(height) => {
                let top = self.body.spacer_top(row);
                Range::with_length(top.floor() as usize, height.ceil() as usize)
            }
            None => Range::empty(),
        };
        let target = row_range.combine_with(&spacer_range);
        self.scroll_vertically_to(
            target.start() as f64,
            target.end() as f64,
            destination,
            padding,
        )
    }

    fn scroll_vertically_to(
        &mut self,
        target_start: f64,
        target_end: f64,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<()> {
        let pos = self.vertical_target(target_start, target_end, destination, padding)?;
        vtrace!(target_start, target_end, pos, "scroll vertically");
        self.env.vertical.set_scroll_pos(pos);
        self.flush();
        Ok(())
    }

    fn vertical_target(
        &self,
        target_start: f64,
        target_end: f64,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<f64> {
        let viewport_start = self.env.vertical.scroll_pos();
        let viewport_end = viewport_start + self.env.layout.body_height();
        let pos = scroller::get_scroll_pos(
            destination,
            target_start,
            target_end,
            viewport_start,
            viewport_end,
            padding,
        )?;
        Ok(pos.min(self.env.vertical.max_scroll_pos()).max(0.0))
    }

    /// Scrolls horizontally so column `index` is placed according to `destination`.
    ///
    /// Frozen columns are always visible and cannot be scrolled to.
    pub fn scroll_to_column(
        &mut self,
        index: usize,
        destination: ScrollDestination,
        padding: f64,
    ) -> Result<()> {
        let columns = self.env.columns.column_count();
        if index >= columns {
            return Err(EscalatorError::out_of_bounds(index, 0, columns));
        }
        if index < self.env.columns.frozen_column_count() {
            return Err(EscalatorError::invalid(format!(
                "column {index} is frozen and cannot be scrolled to"
            )));
        }
        let frozen_px = self.env.columns.frozen_width();
        let target_start = self
            .env
            .columns
            .calculated_columns_width(Range::with_length(0, index))
            - frozen_px;
        let target_end = target_start + self.env.columns.column_width_actual(index)?;
        let viewport_start = self.env.horizontal.scroll_pos();
        let mut viewport_end = viewport_start + self.env.layout.width - frozen_px;
        if self.env.vertical.shows_scroll_handle() {
            viewport_end -= self.env.vertical.thickness();
        }
        let pos = scroller::get_scroll_pos(
            destination,
            target_start,
            target_end,
            viewport_start,
            viewport_end,
            padding,
        )?;
        self.env.horizontal.set_scroll_pos(pos);
        self.flush();
        Ok(())
    }

    /// Applies a wheel event. Returns whether the event was used for scrolling, i.e. whether
    /// the host should suppress its default handling.
    pub fn on_wheel(&mut self, dx: f64, dy: f64, mode: WheelDeltaMode) -> bool {
        let (dx, dy) = scroller::wheel_deltas_to_px(dx, dy, mode, self.body.row_height());
        self.scroll_by(dx, dy)
    }

    /// Moves both scrollbars by pixel deltas. `NaN` deltas are ignored.
    ///
    /// Returns whether the movement was warranted: a non-zero delta on an axis that shows a
    /// scroll handle.
    pub fn scroll_by(&mut self, dx: f64, dy: f64) -> bool {
        if !dx.is_nan() {
            self.env.horizontal.set_scroll_pos_by_delta(dx);
        }
        if !dy.is_nan() {
            self.env.vertical.set_scroll_pos_by_delta(dy);
        }
        let warranted = (dy != 0.0 && self.env.vertical.shows_scroll_handle())
            || (dx != 0.0 && self.env.horizontal.shows_scroll_handle());
        self.flush();
        warranted
    }

    /// Marks a touch gesture as active. The body is not re-sorted while touching; ending the
    /// gesture schedules a sort.
    pub fn set_touch_active(&mut self, active: bool) {
        if self.env.touching == active {
            return;
        }
        self.env.touching = active;
        if !active && self.env.attached {
            self.env.schedule_sort();
        }
    }

    pub fn is_touch_active(&self) -> bool {
        self.env.touching
    }

    /// Delivers an animation frame requested through [`Surface::request_animation_frame`].
    pub fn on_animation_frame(&mut self, ticket: FrameTicket, now_ms: u64) {
        match self.env.sorter.on_frame(ticket, now_ms, self.env.touching) {
            SortStep::Ignore => {}
            SortStep::Wait(next) => self.env.surface.request_animation_frame(next),
            SortStep::Sort => {
                if self.env.attached {
                    self.body.sort_dom_elements(&mut self.env);
                }
            }
        }
    }

    /// Whether a deferred sort or a scroll update is still outstanding.
    pub fn is_work_pending(&self) -> bool {
        self.env.sorter.is_waiting()
            || self.env.vertical.is_work_pending()
            || self.env.horizontal.is_work_pending()
    }

    /// Logical body rows currently materialized.
    pub fn visible_row_range(&self) -> Range {
        self.body.visible_row_range()
    }

    /// Most body rows the current viewport can need at once.
    pub fn max_visible_row_count(&self) -> usize {
        self.body.max_capacity(&self.env)
    }

    // ---- internals ----

    /// Calls `f` for every rendered row with its logical index.
    fn for_each_row(
        &mut self,
        mut f: impl FnMut(&mut SectionCore, &mut Shared<S>, &mut RowElement, usize),
    ) {
        let env = &mut self.env;
        for section in [&mut self.header, &mut self.footer] {
            let (core, rows) = section.rows_mut();
            for (logical, row) in rows.iter_mut().enumerate() {
                f(core, env, row, logical);
            }
        }
        let (core, rows, top) = self.body.parts_mut();
        for (visual, row) in rows.iter_mut().enumerate() {
            f(core, env, row, top + visual);
        }
    }

    fn sync_section_heights(&mut self) {
        self.env.layout.header_height = self.header.height();
        self.env.layout.footer_height = self.footer.height();
    }

    fn recalculate_element_sizes(&mut self) {
        if self.env.attached {
            self.sync_section_heights();
        }
        self.body.recalculate_scrollbars(&mut self.env);
        if self.env.attached {
            self.body.verify_escalator_count(&mut self.env);
            self.body.reapply_spacer_widths(&mut self.env);
            self.body.update_spacer_visibility(&mut self.env);
        }
    }

    fn set_height_internal(&mut self, height: f64) {
        let height = height.max(0.0);
        if height != self.env.layout.height {
            vtrace!(height, "outer height");
            self.env.layout.height = height;
            self.recalculate_element_sizes();
        }
    }

    /// In [`HeightMode::Row`], sizes the escalator to fit the static sections and
    /// `height_by_rows` body rows.
    fn apply_height_by_rows(&mut self) {
        if self.height_mode != HeightMode::Row || self.applying_height_by_rows {
            return;
        }
        self.applying_height_by_rows = true;
        let mut height = self.header.height()
            + self.body.row_height() * self.height_by_rows
            + self.footer.height();
        if self.env.horizontal.shows_scroll_handle() {
            height += self.env.horizontal.thickness();
        }
        self.set_height_internal(height);
        self.applying_height_by_rows = false;
    }

    /// Reacts to scrollbar movement: places frozen cells and the static sections
    /// horizontally, then brings the body up to date.
    fn on_scroll(&mut self) {
        let left = self.env.horizontal.scroll_pos();
        if left != self.env.last_scroll_left {
            self.env.last_scroll_left = left;
            self.for_each_row(|_, env, row, _| SectionCore::update_freeze_position(env, row, left));
            self.env.surface.set_scroll_offset(Section::Header, left, 0.0);
            self.env.surface.set_scroll_offset(Section::Footer, left, 0.0);
            self.body.set_spacers_left(&mut self.env, left);
        }
        self.body.on_vertical_scroll(&mut self.env);
    }

    /// Settles the consequences of an operation: scrollbar visibility changes and pending
    /// scroll events.
    fn flush(&mut self) {
        if self.batch_depth > 0 {
            return;
        }
        for _ in 0..MAX_SETTLE_PASSES {
            let horizontal_toggled = self.env.horizontal.take_visibility_change();
            let vertical_toggled = self.env.vertical.take_visibility_change();
            if horizontal_toggled {
                self.body.verify_escalator_count(&mut self.env);
                self.apply_height_by_rows();
            }
            if vertical_toggled {
                self.body.reapply_spacer_widths(&mut self.env);
            }
            let scrolled_v = self.env.vertical.take_pending_scroll();
            let scrolled_h = self.env.horizontal.take_pending_scroll();
            if scrolled_v || scrolled_h {
                self.on_scroll();
            }
            if !(horizontal_toggled || vertical_toggled || scrolled_v || scrolled_h) {
                return;
            }
        }
        vwarn!("scroll state did not settle");
    }
}

fn find_cell<'a>(
    section: Section,
    element: ElementId,
    mut rows: impl Iterator<Item = (usize, &'a RowElement)>,
) -> Option<CellRef> {
    rows.find_map(|(row, r)| {
        r.cells
            .iter()
            .position(|c| *c == element)
            .map(|column| CellRef {
                section,
                row,
                column,
                element,
            })
    })
}

/// Row operations on the header or the footer.
pub struct StaticSectionMut<'a, S: Surface> {
    escalator: &'a mut Escalator<S>,
    section: Section,
}

impl<S: Surface> StaticSectionMut<'_, S> {
    /// Laid-out height of the section (zero while detached).
    pub fn height(&self) -> f64 {
        match self.section {
            Section::Header => self.escalator.header.height(),
            _ => self.escalator.footer.height(),
        }
    }
}

impl<S: Surface> RowContainer for StaticSectionMut<'_, S> {
    fn section(&self) -> Section {
        self.section
    }

    fn row_count(&self) -> usize {
        self.escalator.row_count(self.section)
    }

    fn insert_rows(&mut self, index: usize, count: usize) -> Result<()> {
        self.escalator.insert_rows(self.section, index, count)
    }

    fn remove_rows(&mut self, index: usize, count: usize) -> Result<()> {
        self.escalator.remove_rows(self.section, index, count)
    }

    fn refresh_rows(&mut self, index: usize, count: usize) -> Result<()> {
        self.escalator.refresh_rows(self.section, index, count)
    }

    fn default_row_height(&self) -> f64 {
        self.escalator.default_row_height(self.section)
    }

    fn set_default_row_height(&mut self, px: f64) -> Result<()> {
        self.escalator.set_default_row_height(self.section, px)
    }

    fn set_updater(&mut self, updater: BoxedRowUpdater) {
        self.escalator.set_updater(self.section, updater);
    }

    fn row_element(&self, index: usize) -> Result<ElementId> {
        self.escalator.row_element(self.section, index)
    }
}

/// Row and spacer operations on the body.
pub struct BodyMut<'a, S: Surface> {
    escalator: &'a mut Escalator<S>,
}

impl<S: Surface> BodyMut<'_, S> {
    /// Creates, resizes or removes the spacer below `row`.
    ///
    /// `row` is in `-1..row_count`, where `-1` is the spacer above the first row. A negative
    /// `height` removes the spacer.
    pub fn set_spacer(&mut self, row: isize, height: f64) -> Result<()> {
        let escalator = &mut *self.escalator;
        escalator.body.set_spacer(&mut escalator.env, row, height)?;
        escalator.recalculate_element_sizes();
        escalator.flush();
        Ok(())
    }

    pub fn spacer_exists(&self, row: isize) -> bool {
        self.escalator.body.spacer_exists(row)
    }

    /// Height of the spacer below `row`, if any.
    pub fn spacer_height(&self, row: isize) -> Option<f64> {
        self.escalator.body.spacer_height(row)
    }

    /// Elements of a rendered spacer.
    pub fn spacer(&self, row: isize) -> Option<SpacerHandle> {
        self.escalator.body.spacer_handle(row)
    }

    /// Replaces the spacer updater. Live spacers are torn down with the old updater and
    /// initialized with the new one.
    pub fn set_spacer_updater(&mut self, updater: BoxedSpacerUpdater) {
        self.escalator.body.set_spacer_updater(updater);
    }

    /// Total height of every spacer.
    pub fn spacer_heights_sum(&self) -> f64 {
        self.escalator.body.spacers.sum()
    }

    /// Height of the spacers strictly above logical row `row`.
    pub fn spacer_heights_sum_until_index(&self, row: usize) -> f64 {
        self.escalator.body.spacers.sum_until_index(row as isize)
    }

    /// Spacer pixels above body pixel `px`.
    pub fn spacer_heights_sum_until_px(&self, px: f64) -> f64 {
        self.escalator
            .body
            .spacers
            .sum_until_px(&self.escalator.env.positions, px)
    }

    /// Spacer pixels between `from_px` and `to_px`, including spacers that cross a bound
    /// according to the inclusion rules.
    pub fn spacer_heights_sum_between_px(
        &self,
        from_px: f64,
        from_inclusion: SpacerInclusion,
        to_px: f64,
        to_inclusion: SpacerInclusion,
    ) -> f64 {
        self.escalator.body.spacers.sum_between_px(
            &self.escalator.env.positions,
            from_px,
            from_inclusion,
            to_px,
            to_inclusion,
        )
    }

    /// Rows whose spacers lie after body pixel `px`.
    pub fn spacers_after_px(&self, px: f64, inclusion: SpacerInclusion) -> Vec<isize> {
        self.escalator
            .body
            .spacers
            .rows_after_px(&self.escalator.env.positions, px, inclusion)
    }

    /// Top of logical row `row` in body pixels.
    pub fn row_top(&self, row: usize) -> f64 {
        self.escalator.body.row_top(row)
    }

    /// First logical row bound to the pool.
    pub fn top_row_index(&self) -> usize {
        self.escalator.body.top_row_index()
    }

    /// Row elements currently materialized.
    pub fn dom_row_count(&self) -> usize {
        self.escalator.body.dom_row_count()
    }

    /// Height of all rows and spacers.
    pub fn content_height(&self) -> f64 {
        self.escalator.body.content_height()
    }
}

impl<S: Surface> RowContainer for BodyMut<'_, S> {
    fn section(&self) -> Section {
        Section::Body
    }

    fn row_count(&self) -> usize {
        self.escalator.body.row_count()
    }

    fn insert_rows(&mut self, index: usize, count: usize) -> Result<()> {
        self.escalator.insert_rows(Section::Body, index, count)
    }

    fn remove_rows(&mut self, index: usize, count: usize) -> Result<()> {
        self.escalator.remove_rows(Section::Body, index, count)
    }

    fn refresh_rows(&mut self, index: usize, count: usize) -> Result<()> {
        self.escalator.refresh_rows(Section::Body, index, count)
    }

    fn default_row_height(&self) -> f64 {
        self.escalator.body.row_height()
    }

    fn set_default_row_height(&mut self, px: f64) -> Result<()> {
        self.escalator.set_default_row_height(Section::Body, px)
    }

    fn set_updater(&mut self, updater: BoxedRowUpdater) {
        self.escalator.set_updater(Section::Body, updater);
    }

    fn row_element(&self, index: usize) -> Result<ElementId> {
        self.escalator.body.row_element(index)
    }
}
