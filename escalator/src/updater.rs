use crate::{ElementId, FlyweightCell, FlyweightRow};

/// Renders content into row cells.
///
/// Attaching a row calls `pre_attach`, inserts the row, then `post_attach` and `update`.
/// Detaching calls `pre_detach`, removes the row, then `post_detach`. Rebinding a row to a new
/// logical index only calls `update`.
///
/// The row cursor and cells are only valid for the duration of the call.
#[allow(unused_variables)]
pub trait RowUpdater {
    fn pre_attach(&mut self, row: &FlyweightRow, cells: &[FlyweightCell]) {}

    fn post_attach(&mut self, row: &FlyweightRow, cells: &[FlyweightCell]) {}

    fn update(&mut self, row: &FlyweightRow, cells: &[FlyweightCell]);

    fn pre_detach(&mut self, row: &FlyweightRow, cells: &[FlyweightCell]) {}

    fn post_detach(&mut self, row: &FlyweightRow, cells: &[FlyweightCell]) {}
}

/// A view of a spacer handed to [`SpacerUpdater`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpacerHandle {
    /// The logical row the spacer follows; `-1` places it above the first row.
    pub row: isize,
    pub root: ElementId,
    /// The element that receives the spacer content.
    pub content: ElementId,
    pub decoration: ElementId,
    pub height: f64,
}

/// Initializes and tears down spacer content.
#[allow(unused_variables)]
pub trait SpacerUpdater {
    fn init(&mut self, spacer: &SpacerHandle);

    fn destroy(&mut self, spacer: &SpacerHandle) {}
}

/// The updater installed until the host provides one. Renders nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullUpdater;

impl RowUpdater for NullUpdater {
    fn update(&mut self, _row: &FlyweightRow, _cells: &[FlyweightCell]) {}
}

impl SpacerUpdater for NullUpdater {
    fn init(&mut self, _spacer: &SpacerHandle) {}
}

pub type BoxedRowUpdater = Box<dyn RowUpdater + Send>;
pub type BoxedSpacerUpdater = Box<dyn SpacerUpdater + Send>;
