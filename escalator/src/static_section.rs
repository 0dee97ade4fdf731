use crate::section::{RowElement, SectionCore, Shared};
use crate::{ElementId, EscalatorError, Range, Result, Section, Surface};

/// A header or footer: every logical row is materialized, in order.
///
/// Logical, visual and physical indexes coincide, so painting is a plain insert or remove at
/// the same index.
#[derive(Debug)]
pub(crate) struct StaticSection {
    pub(crate) core: SectionCore,
    rows: Vec<RowElement>,
    height: f64,
}

impl StaticSection {
    pub(crate) fn new(section: Section, row_height: Option<f64>) -> Self {
        debug_assert!(section != Section::Body, "the body is not a static section");
        Self {
            core: SectionCore::new(section, row_height),
            rows: Vec::new(),
            height: 0.0,
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.core.rows
    }

    /// Laid-out height of the section.
    pub(crate) fn height(&self) -> f64 {
        self.height
    }

    pub(crate) fn elements(&self) -> &[RowElement] {
        &self.rows
    }

    pub(crate) fn has_rendered_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    pub(crate) fn insert_rows<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        index: usize,
        count: usize,
    ) -> Result<()> {
        self.core.validate_insert(index, count)?;
        self.core.rows += count;
        vdebug!(section = ?self.core.section, index, count, "insert rows");
        if env.attached {
            self.paint_insert_rows(env, index, count);
            self.recalculate_height(env);
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
        vdebug!(section = ?self.core.section, index, count, "remove rows");
        if env.attached && !self.rows.is_empty() {
            self.paint_remove_rows(env, index, count);
            self.recalculate_height(env);
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
        let columns = Range::with_length(0, env.columns.column_count());
        self.refresh_cells(env, Range::with_length(index, count), columns);
        Ok(())
    }

    pub(crate) fn refresh_cells<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        rows: Range,
        columns: Range,
    ) {
        let rows = rows.restrict_to(&Range::with_length(0, self.rows.len()));
        for logical in rows {
            self.core.refresh_row(env, &self.rows[logical], logical, columns);
        }
    }

    pub(crate) fn row_element(&self, index: usize) -> Result<ElementId> {
        if index >= self.core.rows {
            return Err(EscalatorError::out_of_bounds(index, 0, self.core.rows));
        }
        self.rows.get(index).map(|r| r.id).ok_or_else(|| {
            EscalatorError::IllegalState(format!(
                "row {index} of the {:?} is not rendered while detached",
                self.core.section
            ))
        })
    }

    /// Materializes every logical row.
    pub(crate) fn attach<S: Surface>(&mut self, env: &mut Shared<S>) {
        if self.core.rows > 0 {
            self.paint_insert_rows(env, 0, self.core.rows);
        }
        self.recalculate_height(env);
    }

    /// Detaches and destroys every rendered row.
    pub(crate) fn detach<S: Surface>(&mut self, env: &mut Shared<S>) {
        let rendered = self.rows.len();
        if rendered > 0 {
            self.paint_remove_rows(env, 0, rendered);
        }
        self.height = 0.0;
    }

    pub(crate) fn reapply_default_row_heights<S: Surface>(&mut self, env: &mut Shared<S>) {
        for row in &self.rows {
            self.core.reapply_row_height(env, row);
        }
        self.recalculate_height(env);
    }

    fn paint_insert_rows<S: Surface>(&mut self, env: &mut Shared<S>, index: usize, count: usize) {
        for logical in index..index + count {
            let row = self.core.create_row(env);
            let reference = logical.checked_sub(1).map(|i| self.rows[i].id);
            self.core.attach_row(env, &row, logical, reference);
            self.rows.insert(logical, row);
        }
        for row in &self.rows {
            SectionCore::reapply_row_width(env, row);
        }
    }

    fn paint_remove_rows<S: Surface>(&mut self, env: &mut Shared<S>, index: usize, count: usize) {
        let removed: Vec<RowElement> = self.rows.drain(index..index + count).collect();
        for (offset, row) in removed.into_iter().enumerate() {
            self.core.detach_row(env, row, index + offset);
        }
    }

    fn recalculate_height<S: Surface>(&mut self, env: &mut Shared<S>) {
        let height = self.rows.len() as f64 * self.core.default_row_height;
        if height != self.height {
            vtrace!(section = ?self.core.section, from = self.height, to = height, "section height");
            self.height = height;
            env.surface.section_height_changed(self.core.section, height);
        }
    }

    /// Replaces the updater and refreshes every rendered row with it.
    pub(crate) fn set_updater<S: Surface>(
        &mut self,
        env: &mut Shared<S>,
        updater: crate::BoxedRowUpdater,
    ) {
        self.core.updater = updater;
        let rows = Range::with_length(0, self.rows.len());
        let columns = Range::with_length(0, env.columns.column_count());
        self.refresh_cells(env, rows, columns);
    }

    pub(crate) fn rows_mut(&mut self) -> (&mut SectionCore, &mut Vec<RowElement>) {
        (&mut self.core, &mut self.rows)
    }
}
