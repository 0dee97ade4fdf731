use crate::Direction;

/// Pixel differences below this are treated as equal.
pub const PIXEL_EPSILON: f64 = 0.1;

pub(crate) fn pixel_values_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= PIXEL_EPSILON
}

/// The scroll primitive of one axis.
///
/// Holds the scroll position, the scrollable content size (`scroll_size`) and the visible size
/// (`offset_size`). Every position change is clamped to `[0, max_scroll_pos]` after truncating
/// toward zero, and raises a pending scroll event that the escalator drains to resync its
/// sections.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollbarBundle {
    direction: Direction,
    scroll_pos: f64,
    max_scroll_pos: f64,
    scroll_size: f64,
    offset_size: f64,
    thickness: f64,
    locked: bool,
    handle_visible: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pending_scroll: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    visibility_changed: bool,
}

impl ScrollbarBundle {
    pub fn new(direction: Direction, thickness: f64) -> Self {
        Self {
            direction,
            scroll_pos: 0.0,
            max_scroll_pos: 0.0,
            scroll_size: 0.0,
            offset_size: 0.0,
            thickness: thickness.max(0.0),
            locked: false,
            handle_visible: false,
            pending_scroll: false,
            visibility_changed: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn scroll_pos(&self) -> f64 {
        self.scroll_pos
    }

    pub fn set_scroll_pos(&mut self, px: f64) {
        if self.locked || px.is_nan() {
            return;
        }
        let old = self.scroll_pos;
        self.scroll_pos = px.trunc().min(self.max_scroll_pos).max(0.0);
        if !pixel_values_equal(old, self.scroll_pos) {
            vtrace!(direction = ?self.direction, from = old, to = self.scroll_pos, "scroll_pos");
            self.pending_scroll = true;
        }
    }

    pub fn set_scroll_pos_by_delta(&mut self, delta: f64) {
        if delta != 0.0 {
            self.set_scroll_pos(self.scroll_pos + delta);
        }
    }

    pub fn max_scroll_pos(&self) -> f64 {
        self.max_scroll_pos
    }

    pub fn scroll_size(&self) -> f64 {
        self.scroll_size
    }

    pub fn set_scroll_size(&mut self, px: f64) {
        if self.shows_scroll_handle() && px <= self.offset_size && self.scroll_pos != 0.0 {
            self.set_scroll_pos(0.0);
        }
        self.scroll_size = px.max(0.0);
        self.recalculate();
    }

    pub fn offset_size(&self) -> f64 {
        self.offset_size
    }

    pub fn set_offset_size(&mut self, px: f64) {
        if self.shows_scroll_handle() && px > self.scroll_size && self.scroll_pos != 0.0 {
            self.set_scroll_pos(0.0);
        }
        self.offset_size = px.max(0.0);
        self.recalculate();
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn set_thickness(&mut self, px: f64) {
        self.thickness = px.max(0.0);
    }

    /// Whether the content overflows the visible size, i.e. a scroll handle is shown.
    pub fn shows_scroll_handle(&self) -> bool {
        self.scroll_size - self.offset_size > PIXEL_EPSILON
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// A locked scrollbar ignores position changes.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Whether a scroll event is waiting to be handled.
    pub fn is_work_pending(&self) -> bool {
        self.pending_scroll
    }

    pub(crate) fn take_pending_scroll(&mut self) -> bool {
        std::mem::take(&mut self.pending_scroll)
    }

    pub(crate) fn take_visibility_change(&mut self) -> bool {
        std::mem::take(&mut self.visibility_changed)
    }

    fn recalculate(&mut self) {
        self.max_scroll_pos = (self.scroll_size - self.offset_size).max(0.0);
        if self.scroll_pos > self.max_scroll_pos {
            // Shrinking content pulls the position back even when locked.
            let locked = std::mem::replace(&mut self.locked, false);
            self.set_scroll_pos(self.max_scroll_pos);
            self.locked = locked;
        }
        let visible = self.shows_scroll_handle();
        if visible != self.handle_visible {
            self.handle_visible = visible;
            self.visibility_changed = true;
        }
    }
}
