//! A headless virtualized grid engine.
//!
//! For host-side input helpers (touch inertia, wheel snapping, smooth scrolling), see the
//! `escalator-adapter` crate.
//!
//! An [`Escalator`] lays out a header, a body and a footer that share one set of columns. Only
//! the body rows that fit the viewport are materialized; scrolling rebinds those rows to new
//! logical indexes instead of creating elements, and a deferred sort restores their physical
//! order once scrolling calms down. Spacers (expandable regions below body rows) and frozen
//! columns are reconciled along with the rows.
//!
//! It is UI-agnostic. The host provides:
//! - a [`Surface`] that executes element commands (create, insert, position, size, ...)
//! - the outer size and scroll/wheel input
//! - animation frames for the tickets the escalator requests
//! - row content through [`RowUpdater`] and [`SpacerUpdater`] callbacks
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod body;
mod column;
mod error;
mod escalator;
mod flyweight;
mod options;
mod position;
mod range;
mod scrollbar;
mod scroller;
mod section;
mod sorter;
mod spacer;
mod static_section;
mod surface;
mod types;
mod updater;

#[cfg(test)]
mod tests;

pub use column::{ColumnConfiguration, DEFAULT_COLUMN_WIDTH_PX};
pub use error::{EscalatorError, Result};
pub use escalator::{BodyMut, Escalator, StaticSectionMut};
pub use flyweight::{FlyweightCell, FlyweightRow};
pub use options::{
    DEFAULT_SCROLLBAR_THICKNESS, DEFAULT_STYLE_NAME, EscalatorOptions, VisibilityCallback,
};
pub use position::PositionTracker;
pub use range::Range;
pub use scrollbar::{PIXEL_EPSILON, ScrollbarBundle};
pub use scroller::{WheelDeltaMode, get_scroll_pos, snap_deltas};
pub use section::{DEFAULT_ROW_HEIGHT_PX, RowContainer};
pub use sorter::FrameTicket;
pub use surface::{Clip, HeadlessSurface, Surface};
pub use types::{
    CellRef, Direction, ElementId, ElementKind, HeightMode, RowVisibility, ScrollDestination,
    ScrollState, Section, SpacerInclusion,
};
pub use updater::{
    BoxedRowUpdater, BoxedSpacerUpdater, NullUpdater, RowUpdater, SpacerHandle, SpacerUpdater,
};
