use crate::scrollbar::PIXEL_EPSILON;
use crate::section::Shared;
use crate::{EscalatorError, Range, Result, ScrollDestination, Surface};

/// Unit of a wheel delta, as reported by the host's input layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WheelDeltaMode {
    #[default]
    Pixel,
    /// Deltas count lines; one line is one default body row.
    Line,
    /// Not supported; the deltas are used as pixels.
    Page,
}

/// Scroll position that brings `target_start..target_end` into the viewport
/// `viewport_start..viewport_end` according to `destination`.
///
/// `padding` is extra space kept around the target. [`ScrollDestination::Middle`] does not
/// accept padding.
pub fn get_scroll_pos(
    destination: ScrollDestination,
    target_start: f64,
    target_end: f64,
    viewport_start: f64,
    viewport_end: f64,
    padding: f64,
) -> Result<f64> {
    let viewport_len = viewport_end - viewport_start;
    Ok(match destination {
        ScrollDestination::Any => {
            let start_pos = target_start - padding;
            if start_pos < viewport_start {
                start_pos
            } else if target_end + padding > viewport_end {
                target_end + padding - viewport_len
            } else {
                viewport_start
            }
        }
        ScrollDestination::End => target_end + padding - viewport_len,
        ScrollDestination::Middle => {
            if padding != 0.0 {
                return Err(EscalatorError::invalid(format!(
                    "padding must be zero when scrolling to the middle (was {padding})"
                )));
            }
            let middle = target_start + (target_end - target_start) / 2.0;
            middle - viewport_len / 2.0
        }
        ScrollDestination::Start => target_start - padding,
    })
}

/// Drops the minor axis of a diagonal delta.
///
/// When both deltas are non-zero, an axis whose magnitude relative to the other is below
/// `threshold` (a ratio in `0..1`) is zeroed.
pub fn snap_deltas(dx: f64, dy: f64, threshold: f64) -> (f64, f64) {
    if dx == 0.0 || dy == 0.0 {
        return (dx, dy);
    }
    let (ax, ay) = (dx.abs(), dy.abs());
    let x = if ax / ay < threshold { 0.0 } else { dx };
    let y = if ay / ax < threshold { 0.0 } else { dy };
    (x, y)
}

/// Converts wheel deltas to pixels.
pub(crate) fn wheel_deltas_to_px(dx: f64, dy: f64, mode: WheelDeltaMode, row_height: f64) -> (f64, f64) {
    match mode {
        WheelDeltaMode::Pixel => (dx, dy),
        WheelDeltaMode::Line => (dx, dy * row_height),
        WheelDeltaMode::Page => {
            vwarn!(?mode, "unsupported wheel delta mode, using pixels");
            (dx, dy)
        }
    }
}

/// Sizes the wrapper and both scrollbars for the current content.
///
/// Each scrollbar's need accounts for the other one's thickness. The horizontal scrollbar
/// covers only the unfrozen columns, and keeps its position across the resize.
pub(crate) fn recalculate_scrollbars<S: Surface>(env: &mut Shared<S>, content_height: f64) {
    let layout = env.layout;
    let content_width = env.columns.row_width();
    let sections_height = layout.header_height + layout.footer_height;
    let v_thickness = env.vertical.thickness();
    let h_thickness = env.horizontal.thickness();

    let mut vertical_needed = content_height > layout.height + PIXEL_EPSILON - sections_height;
    let mut horizontal_needed = content_width > layout.width + PIXEL_EPSILON;
    if vertical_needed != horizontal_needed {
        if horizontal_needed {
            vertical_needed =
                content_height > layout.height + PIXEL_EPSILON - sections_height - h_thickness;
        } else {
            horizontal_needed = content_width > layout.width + PIXEL_EPSILON - v_thickness;
        }
    }

    env.layout.wrapper_width = if vertical_needed {
        (layout.width - v_thickness).max(0.0)
    } else {
        layout.width
    };
    env.layout.wrapper_height = if horizontal_needed {
        (layout.height - h_thickness).max(0.0)
    } else {
        layout.height
    };

    let v_offset = (env.layout.wrapper_height - sections_height).max(0.0);
    env.vertical.set_offset_size(v_offset);
    env.vertical.set_scroll_size(content_height);

    let previous_left = env.horizontal.scroll_pos();
    let frozen = env.columns.frozen_column_count();
    let unfrozen = env
        .columns
        .calculated_columns_width(Range::between(frozen, env.columns.column_count()));
    let frozen_px = env.columns.frozen_width();
    env.horizontal
        .set_offset_size((env.layout.wrapper_width - frozen_px).max(0.0));
    env.horizontal.set_scroll_size(unfrozen);
    env.horizontal.set_scroll_pos(previous_left);

    vtrace!(
        content_height,
        content_width,
        vertical_needed,
        horizontal_needed,
        "recalculated scrollbars"
    );
}
