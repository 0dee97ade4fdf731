use crate::{ElementId, Range};

/// A cell view handed to updaters.
///
/// Cells are plain values; they carry no identity beyond the element they currently point at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlyweightCell {
    column: usize,
    element: ElementId,
    width: f64,
}

impl FlyweightCell {
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The calculated width of the column, or `-1.0` while a measurement is pending.
    pub fn width(&self) -> f64 {
        self.width
    }
}

/// A reusable cursor over one row element.
///
/// The escalator owns a single instance and rebinds it with [`FlyweightRow::setup`] before
/// every updater call, so walking rows during scrolling never allocates once the cell buffer
/// has grown to the column count.
#[derive(Debug, Default)]
pub struct FlyweightRow {
    element: Option<ElementId>,
    row: usize,
    cells: Vec<FlyweightCell>,
}

impl FlyweightRow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Binds the cursor to `element` showing logical row `row`.
    ///
    /// `cells` are the cell elements in column order; `widths` the calculated column widths.
    pub(crate) fn setup(&mut self, element: ElementId, row: usize, cells: &[ElementId], widths: &[f64]) {
        debug_assert!(self.element.is_none(), "flyweight row was not torn down");
        debug_assert_eq!(cells.len(), widths.len(), "cell count does not match column count");
        self.element = Some(element);
        self.row = row;
        self.cells.clear();
        self.cells.extend(cells.iter().zip(widths).enumerate().map(
            |(column, (&element, &width))| FlyweightCell {
                column,
                element,
                width,
            },
        ));
    }

    pub(crate) fn teardown(&mut self) {
        self.element = None;
        self.cells.clear();
    }

    /// The row element, or `None` outside of an updater call.
    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    /// The logical row index the element currently shows.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn cells(&self) -> &[FlyweightCell] {
        &self.cells
    }

    /// The cells in `columns`, clamped to the bound row.
    pub fn cells_in(&self, columns: Range) -> &[FlyweightCell] {
        let columns = columns.restrict_to(&Range::with_length(0, self.cells.len()));
        &self.cells[columns.start()..columns.end()]
    }
}
