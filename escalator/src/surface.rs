use std::collections::{HashMap, HashSet};

use crate::{DEFAULT_COLUMN_WIDTH_PX, ElementId, ElementKind, FrameTicket, Section};

/// A vertical clip applied to a spacer decoration, in body content coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clip {
    pub top: f64,
    pub bottom: f64,
}

/// The rendering layer the escalator drives.
///
/// The escalator owns all bookkeeping (which element is bound to which row, where it is
/// placed, in which order rows should appear) and tells the surface what to do. Every method
/// has a no-op default so a surface only implements what its backend needs.
///
/// DOM order is expressed through [`Surface::insert_after`]: `reference == None` means "insert
/// as the first child of the section". Inserting an element that is already attached moves it.
#[allow(unused_variables)]
pub trait Surface {
    fn create_element(&mut self, section: Section, kind: ElementKind, element: ElementId) {}

    fn destroy_element(&mut self, element: ElementId) {}

    /// Attaches (or moves) a row-like element inside `section` right after `reference`.
    fn insert_after(&mut self, section: Section, element: ElementId, reference: Option<ElementId>) {
    }

    /// Detaches a row-like element from `section`.
    fn remove(&mut self, section: Section, element: ElementId) {}

    /// Attaches `cell` to `row` at child position `index`.
    fn insert_cell(&mut self, row: ElementId, cell: ElementId, index: usize) {}

    fn remove_cell(&mut self, row: ElementId, cell: ElementId) {}

    fn set_position(&mut self, element: ElementId, x: f64, y: f64) {}

    /// Clears any placement previously applied with `set_position`.
    fn reset_position(&mut self, element: ElementId) {}

    fn set_width(&mut self, element: ElementId, px: f64) {}

    fn set_height(&mut self, element: ElementId, px: f64) {}

    fn set_displayed(&mut self, element: ElementId, displayed: bool) {}

    /// Replaces the primary style name of an element (e.g. `v-escalator-row`).
    fn set_style_name(&mut self, element: ElementId, name: &str) {}

    /// Toggles a secondary class name (`frozen`, `last-frozen`).
    fn set_class(&mut self, element: ElementId, class: &str, enabled: bool) {}

    fn set_clip(&mut self, element: ElementId, clip: Option<Clip>) {}

    /// The laid-out height of a static section changed.
    fn section_height_changed(&mut self, section: Section, height: f64) {}

    /// Translates the section content for the current scroll position.
    fn set_scroll_offset(&mut self, section: Section, left: f64, top: f64) {}

    /// Width the cell's content requires when unconstrained.
    fn measure_cell_width(&self, section: Section, column: usize, cell: ElementId) -> f64 {
        0.0
    }

    /// Height of a probe row in `section`, or `None` if it cannot be measured.
    fn measure_row_height(&self, section: Section) -> Option<f64> {
        None
    }

    /// The row in `section` that contains input focus.
    fn focused_row(&self, section: Section) -> Option<ElementId> {
        None
    }

    /// Asks the host to call `Escalator::on_animation_frame(ticket, now_ms)` on the next frame.
    fn request_animation_frame(&mut self, ticket: FrameTicket) {}
}

impl<T: Surface + ?Sized> Surface for &mut T {
    fn create_element(&mut self, section: Section, kind: ElementKind, element: ElementId) {
        (**self).create_element(section, kind, element)
    }
    fn destroy_element(&mut self, element: ElementId) {
        (**self).destroy_element(element)
    }
    fn insert_after(&mut self, section: Section, element: ElementId, reference: Option<ElementId>) {
        (**self).insert_after(section, element, reference)
    }
    fn remove(&mut self, section: Section, element: ElementId) {
        (**self).remove(section, element)
    }
    fn insert_cell(&mut self, row: ElementId, cell: ElementId, index: usize) {
        (**self).insert_cell(row, cell, index)
    }
    fn remove_cell(&mut self, row: ElementId, cell: ElementId) {
        (**self).remove_cell(row, cell)
    }
    fn set_position(&mut self, element: ElementId, x: f64, y: f64) {
        (**self).set_position(element, x, y)
    }
    fn reset_position(&mut self, element: ElementId) {
        (**self).reset_position(element)
    }
    fn set_width(&mut self, element: ElementId, px: f64) {
        (**self).set_width(element, px)
    }
    fn set_height(&mut self, element: ElementId, px: f64) {
        (**self).set_height(element, px)
    }
    fn set_displayed(&mut self, element: ElementId, displayed: bool) {
        (**self).set_displayed(element, displayed)
    }
    fn set_style_name(&mut self, element: ElementId, name: &str) {
        (**self).set_style_name(element, name)
    }
    fn set_class(&mut self, element: ElementId, class: &str, enabled: bool) {
        (**self).set_class(element, class, enabled)
    }
    fn set_clip(&mut self, element: ElementId, clip: Option<Clip>) {
        (**self).set_clip(element, clip)
    }
    fn section_height_changed(&mut self, section: Section, height: f64) {
        (**self).section_height_changed(section, height)
    }
    fn set_scroll_offset(&mut self, section: Section, left: f64, top: f64) {
        (**self).set_scroll_offset(section, left, top)
    }
    fn measure_cell_width(&self, section: Section, column: usize, cell: ElementId) -> f64 {
        (**self).measure_cell_width(section, column, cell)
    }
    fn measure_row_height(&self, section: Section) -> Option<f64> {
        (**self).measure_row_height(section)
    }
    fn focused_row(&self, section: Section) -> Option<ElementId> {
        (**self).focused_row(section)
    }
    fn request_animation_frame(&mut self, ticket: FrameTicket) {
        (**self).request_animation_frame(ticket)
    }
}

/// An in-memory surface that mirrors what a DOM backend would hold.
///
/// Useful for tests, simulations and server-side layout: it keeps the physical child order of
/// every section, the applied positions and sizes, and answers measurement queries from
/// configurable values.
#[derive(Clone, Debug, Default)]
pub struct HeadlessSurface {
    kinds: HashMap<ElementId, ElementKind>,
    children: [Vec<ElementId>; 3],
    cells: HashMap<ElementId, Vec<ElementId>>,
    positions: HashMap<ElementId, (f64, f64)>,
    widths: HashMap<ElementId, f64>,
    heights: HashMap<ElementId, f64>,
    hidden: HashSet<ElementId>,
    classes: HashMap<ElementId, Vec<String>>,
    style_names: HashMap<ElementId, String>,
    content_widths: HashMap<(Section, usize), f64>,
    section_heights: [f64; 3],
    scroll_offsets: [(f64, f64); 3],
    row_height: Option<f64>,
    focused: Option<ElementId>,
    frames: Vec<FrameTicket>,
}

fn slot(section: Section) -> usize {
    match section {
        Section::Header => 0,
        Section::Body => 1,
        Section::Footer => 2,
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The physical child order of a section (rows and spacer roots).
    pub fn children(&self, section: Section) -> &[ElementId] {
        &self.children[slot(section)]
    }

    pub fn cells_of(&self, row: ElementId) -> &[ElementId] {
        self.cells.get(&row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn kind(&self, element: ElementId) -> Option<ElementKind> {
        self.kinds.get(&element).copied()
    }

    /// Number of elements created and not yet destroyed.
    pub fn live_elements(&self) -> usize {
        self.kinds.len()
    }

    pub fn position(&self, element: ElementId) -> Option<(f64, f64)> {
        self.positions.get(&element).copied()
    }

    pub fn width(&self, element: ElementId) -> Option<f64> {
        self.widths.get(&element).copied()
    }

    pub fn height(&self, element: ElementId) -> Option<f64> {
        self.heights.get(&element).copied()
    }

    pub fn is_displayed(&self, element: ElementId) -> bool {
        !self.hidden.contains(&element)
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.classes
            .get(&element)
            .is_some_and(|c| c.iter().any(|s| s == class))
    }

    pub fn style_name(&self, element: ElementId) -> Option<&str> {
        self.style_names.get(&element).map(String::as_str)
    }

    pub fn section_height(&self, section: Section) -> f64 {
        self.section_heights[slot(section)]
    }

    pub fn scroll_offset(&self, section: Section) -> (f64, f64) {
        self.scroll_offsets[slot(section)]
    }

    /// Sets the width reported for every cell of `column` in `section`. Unset columns report
    /// the default column width.
    pub fn set_content_width(&mut self, section: Section, column: usize, px: f64) {
        self.content_widths.insert((section, column), px);
    }

    /// Sets the height reported by [`Surface::measure_row_height`].
    pub fn set_measured_row_height(&mut self, px: Option<f64>) {
        self.row_height = px;
    }

    pub fn set_focused_row(&mut self, row: Option<ElementId>) {
        self.focused = row;
    }

    /// Drains the animation frame requests issued since the last call.
    pub fn take_frame_requests(&mut self) -> Vec<FrameTicket> {
        std::mem::take(&mut self.frames)
    }

    fn detach(&mut self, element: ElementId) {
        for list in &mut self.children {
            list.retain(|e| *e != element);
        }
    }
}

impl Surface for HeadlessSurface {
    fn create_element(&mut self, _section: Section, kind: ElementKind, element: ElementId) {
        self.kinds.insert(element, kind);
    }

    fn destroy_element(&mut self, element: ElementId) {
        self.detach(element);
        self.kinds.remove(&element);
        self.cells.remove(&element);
        self.positions.remove(&element);
        self.widths.remove(&element);
        self.heights.remove(&element);
        self.hidden.remove(&element);
        self.classes.remove(&element);
        self.style_names.remove(&element);
    }

    fn insert_after(&mut self, section: Section, element: ElementId, reference: Option<ElementId>) {
        self.detach(element);
        let list = &mut self.children[slot(section)];
        let at = reference
            .and_then(|r| list.iter().position(|e| *e == r))
            .map_or(0, |i| i + 1);
        list.insert(at, element);
    }

    fn remove(&mut self, section: Section, element: ElementId) {
        self.children[slot(section)].retain(|e| *e != element);
    }

    fn insert_cell(&mut self, row: ElementId, cell: ElementId, index: usize) {
        let cells = self.cells.entry(row).or_default();
        let index = index.min(cells.len());
        cells.insert(index, cell);
    }

    fn remove_cell(&mut self, row: ElementId, cell: ElementId) {
        if let Some(cells) = self.cells.get_mut(&row) {
            cells.retain(|c| *c != cell);
        }
    }

    fn set_position(&mut self, element: ElementId, x: f64, y: f64) {
        self.positions.insert(element, (x, y));
    }

    fn reset_position(&mut self, element: ElementId) {
        self.positions.remove(&element);
    }

    fn set_width(&mut self, element: ElementId, px: f64) {
        self.widths.insert(element, px);
    }

    fn set_height(&mut self, element: ElementId, px: f64) {
        self.heights.insert(element, px);
    }

    fn set_displayed(&mut self, element: ElementId, displayed: bool) {
        if displayed {
            self.hidden.remove(&element);
        } else {
            self.hidden.insert(element);
        }
    }

    fn set_style_name(&mut self, element: ElementId, name: &str) {
        self.style_names.insert(element, name.to_owned());
    }

    fn set_class(&mut self, element: ElementId, class: &str, enabled: bool) {
        let classes = self.classes.entry(element).or_default();
        classes.retain(|c| c != class);
        if enabled {
            classes.push(class.to_owned());
        }
    }

    fn section_height_changed(&mut self, section: Section, height: f64) {
        self.section_heights[slot(section)] = height;
    }

    fn set_scroll_offset(&mut self, section: Section, left: f64, top: f64) {
        self.scroll_offsets[slot(section)] = (left, top);
    }

    fn measure_cell_width(&self, section: Section, column: usize, _cell: ElementId) -> f64 {
        self.content_widths
            .get(&(section, column))
            .copied()
            .unwrap_or(DEFAULT_COLUMN_WIDTH_PX)
    }

    fn measure_row_height(&self, _section: Section) -> Option<f64> {
        self.row_height
    }

    fn focused_row(&self, section: Section) -> Option<ElementId> {
        let focused = self.focused?;
        self.children[slot(section)]
            .contains(&focused)
            .then_some(focused)
    }

    fn request_animation_frame(&mut self, ticket: FrameTicket) {
        self.frames.push(ticket);
    }
}
