use escalator::snap_deltas;

/// Wheel normalization settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelOptions {
    /// Diagonal deltas whose minor axis is below this ratio of the major axis are locked to the
    /// major axis. `0.0` disables snapping.
    pub axis_snap_threshold: f64,
    /// Multiplier applied to both deltas before scrolling.
    pub speed: f64,
}

impl Default for WheelOptions {
    fn default() -> Self {
        Self {
            axis_snap_threshold: 0.5,
            speed: 1.0,
        }
    }
}

impl WheelOptions {
    pub fn with_axis_snap_threshold(mut self, threshold: f64) -> Self {
        self.axis_snap_threshold = threshold;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Applies speed and axis snapping to raw deltas.
    pub fn normalize(&self, dx: f64, dy: f64) -> (f64, f64) {
        let (dx, dy) = snap_deltas(dx, dy, self.axis_snap_threshold);
        (dx * self.speed, dy * self.speed)
    }
}
