use std::sync::Arc;

use crate::{HeightMode, RowVisibility};

/// A callback fired whenever the rendered logical row range changes.
pub type VisibilityCallback = Arc<dyn Fn(RowVisibility) + Send + Sync>;

/// Primary style name used when none is configured.
pub const DEFAULT_STYLE_NAME: &str = "v-escalator";

/// Thickness given to both scrollbars by default.
pub const DEFAULT_SCROLLBAR_THICKNESS: f64 = 15.0;

/// Configuration for [`crate::Escalator`].
///
/// Cheap to clone: the callback is stored in an `Arc`.
pub struct EscalatorOptions {
    /// Initial outer width in pixels.
    pub width: f64,
    /// Initial outer height in pixels (used in [`HeightMode::Css`]).
    pub height: f64,

    pub scrollbar_thickness: f64,

    /// Row heights per section. `None` detects the height from the surface on attach.
    pub header_row_height: Option<f64>,
    pub body_row_height: Option<f64>,
    pub footer_row_height: Option<f64>,

    pub height_mode: HeightMode,
    /// Body rows shown in [`HeightMode::Row`].
    pub height_by_rows: f64,

    /// Prefix of every style name the escalator applies (`{style}-row`, `{style}-cell`, ...).
    pub style_name: String,

    /// Minimum time between the last row movement and the physical reorder of body rows.
    pub sort_delay_ms: u64,
    /// Minimum number of animation frames before the physical reorder.
    pub sort_frames: u32,

    pub on_row_visibility_change: Option<VisibilityCallback>,
}

impl Clone for EscalatorOptions {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            scrollbar_thickness: self.scrollbar_thickness,
            header_row_height: self.header_row_height,
            body_row_height: self.body_row_height,
            footer_row_height: self.footer_row_height,
            height_mode: self.height_mode,
            height_by_rows: self.height_by_rows,
            style_name: self.style_name.clone(),
            sort_delay_ms: self.sort_delay_ms,
            sort_frames: self.sort_frames,
            on_row_visibility_change: self.on_row_visibility_change.clone(),
        }
    }
}

impl Default for EscalatorOptions {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scrollbar_thickness: DEFAULT_SCROLLBAR_THICKNESS,
            header_row_height: None,
            body_row_height: None,
            footer_row_height: None,
            height_mode: HeightMode::Css,
            height_by_rows: 10.0,
            style_name: DEFAULT_STYLE_NAME.to_owned(),
            sort_delay_ms: 50,
            sort_frames: 3,
            on_row_visibility_change: None,
        }
    }
}

impl EscalatorOptions {
    /// Options for an escalator of the given outer size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_scrollbar_thickness(mut self, px: f64) -> Self {
        self.scrollbar_thickness = px;
        self
    }

    /// Fixes the row height of all three sections.
    pub fn with_row_height(mut self, px: f64) -> Self {
        self.header_row_height = Some(px);
        self.body_row_height = Some(px);
        self.footer_row_height = Some(px);
        self
    }

    pub fn with_header_row_height(mut self, px: Option<f64>) -> Self {
        self.header_row_height = px;
        self
    }

    pub fn with_body_row_height(mut self, px: Option<f64>) -> Self {
        self.body_row_height = px;
        self
    }

    pub fn with_footer_row_height(mut self, px: Option<f64>) -> Self {
        self.footer_row_height = px;
        self
    }

    pub fn with_height_mode(mut self, height_mode: HeightMode) -> Self {
        self.height_mode = height_mode;
        self
    }

    pub fn with_height_by_rows(mut self, rows: f64) -> Self {
        self.height_by_rows = rows;
        self
    }

    pub fn with_style_name(mut self, style_name: impl Into<String>) -> Self {
        self.style_name = style_name.into();
        self
    }

    pub fn with_sort_delay(mut self, delay_ms: u64, frames: u32) -> Self {
        self.sort_delay_ms = delay_ms;
        self.sort_frames = frames;
        self
    }

    pub fn with_on_row_visibility_change(
        mut self,
        f: Option<impl Fn(RowVisibility) + Send + Sync + 'static>,
    ) -> Self {
        self.on_row_visibility_change = f.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for EscalatorOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EscalatorOptions")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scrollbar_thickness", &self.scrollbar_thickness)
            .field("header_row_height", &self.header_row_height)
            .field("body_row_height", &self.body_row_height)
            .field("footer_row_height", &self.footer_row_height)
            .field("height_mode", &self.height_mode)
            .field("height_by_rows", &self.height_by_rows)
            .field("style_name", &self.style_name)
            .field("sort_delay_ms", &self.sort_delay_ms)
            .field("sort_frames", &self.sort_frames)
            .finish_non_exhaustive()
    }
}
