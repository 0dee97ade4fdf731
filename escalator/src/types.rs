/// Opaque identity of an element created by the escalator (rows, cells, spacers, decorations).
///
/// The escalator allocates ids; the [`crate::Surface`] maps them to whatever the rendering
/// layer uses. Ids are never reused within one escalator instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub(crate) u64);

impl ElementId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct ElementIds {
    next: u64,
}

impl ElementIds {
    pub(crate) fn allocate(&mut self) -> ElementId {
        self.next += 1;
        ElementId(self.next)
    }
}

/// The three row containers of an escalator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Section {
    Header,
    Body,
    Footer,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Header, Section::Body, Section::Footer];
}

/// What kind of element an [`ElementId`] was created as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    Row,
    Cell,
    /// The row-like root of a spacer, placed among body rows.
    Spacer,
    /// The element inside a spacer root that receives spacer content.
    SpacerContent,
    /// The decoration drawn next to a spacer, outside the body.
    SpacerDecoration,
}

/// Where a scroll target should end up inside the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDestination {
    /// Scroll as little as possible to reveal the target; no movement if already visible.
    #[default]
    Any,
    Start,
    Middle,
    End,
}

/// How the escalator's height is determined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeightMode {
    /// The host sets the height explicitly (`Escalator::set_size`).
    #[default]
    Css,
    /// The height follows `height_by_rows` body rows plus header and footer.
    Row,
}

/// How a spacer straddling the boundary of a pixel range is counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpacerInclusion {
    /// Count the whole spacer height.
    Complete,
    /// Count only the part that overlaps the range.
    Partial,
    /// Ignore the spacer.
    None,
}

/// The logical rows currently rendered in the body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowVisibility {
    pub first_visible_row: usize,
    pub visible_row_count: usize,
}

/// Scroll axis of a scrollbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Vertical,
    Horizontal,
}

/// A snapshot of both scroll positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollState {
    pub scroll_top: f64,
    pub scroll_left: f64,
}

/// A cell located by element identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRef {
    pub section: Section,
    /// Logical row index.
    pub row: usize,
    pub column: usize,
    pub element: ElementId,
}
