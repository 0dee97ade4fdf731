use crate::{EscalatorError, Range, Result};

/// Width given to columns inserted while any section already has rows.
pub const DEFAULT_COLUMN_WIDTH_PX: f64 = 100.0;

#[derive(Clone, Debug)]
struct Column {
    /// Negative means "measure from content".
    defined: f64,
    calculated: f64,
    measuring_requested: bool,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            defined: -1.0,
            calculated: DEFAULT_COLUMN_WIDTH_PX,
            measuring_requested: false,
        }
    }
}

impl Column {
    fn actual(&self) -> f64 {
        if self.measuring_requested {
            -1.0
        } else {
            self.calculated
        }
    }
}

/// Column bookkeeping shared by all sections: widths and the frozen column count.
///
/// Painting is driven by the escalator; this type only answers questions about widths.
#[derive(Clone, Debug, Default)]
pub struct ColumnConfiguration {
    columns: Vec<Column>,
    frozen: usize,
    widths: Vec<f64>,
}

impl ColumnConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn frozen_column_count(&self) -> usize {
        self.frozen
    }

    /// The width set by the host (`-1.0` for content-measured columns).
    pub fn column_width(&self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        Ok(self.columns[index].defined)
    }

    /// The width in effect, or `-1.0` while a measurement is pending.
    pub fn column_width_actual(&self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        Ok(self.columns[index].actual())
    }

    /// Sum of the calculated widths over `columns`.
    pub fn calculated_columns_width(&self, columns: Range) -> f64 {
        debug_assert!(
            columns.is_subset_of(&Range::with_length(0, self.columns.len())),
            "column range {columns} is outside of 0..{}",
            self.columns.len()
        );
        let columns = columns.restrict_to(&Range::with_length(0, self.columns.len()));
        columns.iter().map(|i| self.columns[i].actual()).sum()
    }

    /// Width of a whole row.
    pub fn row_width(&self) -> f64 {
        self.calculated_columns_width(Range::with_length(0, self.columns.len()))
    }

    pub fn frozen_width(&self) -> f64 {
        self.calculated_columns_width(Range::with_length(0, self.frozen))
    }

    /// Calculated widths in column order.
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.columns.len() {
            Ok(())
        } else {
            Err(EscalatorError::invalid(format!(
                "column index {index} does not exist (column count {})",
                self.columns.len()
            )))
        }
    }

    /// Adds `count` columns at `index`. Columns inserted inside the frozen block are frozen.
    pub(crate) fn insert(&mut self, index: usize, count: usize) {
        self.columns
            .splice(index..index, (0..count).map(|_| Column::default()));
        if index < self.frozen {
            self.frozen += count;
        }
        self.sync_widths();
    }

    pub(crate) fn remove(&mut self, index: usize, count: usize) {
        self.columns.drain(index..index + count);
        if index < self.frozen {
            if index + count < self.frozen {
                self.frozen -= count;
            } else {
                self.frozen = index;
            }
        }
        self.sync_widths();
    }

    pub(crate) fn set_frozen(&mut self, count: usize) {
        self.frozen = count;
    }

    /// Applies a defined width. Returns `true` when the caller must measure the column now.
    pub(crate) fn define_width(&mut self, index: usize, px: f64, attached: bool) -> bool {
        let column = &mut self.columns[index];
        column.defined = px;
        let measure_now = if px < 0.0 {
            if attached {
                true
            } else {
                column.measuring_requested = true;
                false
            }
        } else {
            column.calculated = px;
            false
        };
        self.sync_widths();
        measure_now
    }

    pub(crate) fn set_measured(&mut self, index: usize, px: f64) {
        debug_assert!(px >= 0.0, "measured a negative width for column {index}");
        let column = &mut self.columns[index];
        column.calculated = px.max(0.0);
        column.measuring_requested = false;
        self.sync_widths();
    }

    /// Columns whose measurement was postponed until attach.
    pub(crate) fn pending_measurements(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.measuring_requested)
            .map(|(i, _)| i)
            .collect()
    }

    fn sync_widths(&mut self) {
        self.widths.clear();
        self.widths.extend(self.columns.iter().map(Column::actual));
    }
}
