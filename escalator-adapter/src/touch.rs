use escalator::ScrollState;

use crate::{Easing, Tween};

/// Tuning for [`InertialTouch`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TouchOptions {
    /// Speeds (px/ms) at or below this do not start inertia.
    pub min_velocity: f64,
    /// Speed at which the offset easing saturates.
    pub max_velocity: f64,
    /// Inertia offset per unit of velocity.
    pub velocity_factor: f64,
    /// Added to the acceleration when a touch interrupts a running inertia.
    pub acceleration_step: f64,
    /// An axis only moves while its speed is at least this multiple of the other axis' speed.
    pub axis_ratio: f64,
    /// Base duration of the inertia animation. Larger screens warrant longer durations.
    pub duration_ms: u64,
}

impl Default for TouchOptions {
    fn default() -> Self {
        Self {
            min_velocity: 0.6,
            max_velocity: 4.0,
            velocity_factor: 1500.0,
            acceleration_step: 0.7,
            axis_ratio: 1.0,
            duration_ms: 500,
        }
    }
}

impl TouchOptions {
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_velocity_limits(mut self, min: f64, max: f64) -> Self {
        self.min_velocity = min;
        self.max_velocity = max;
        self
    }

    pub fn with_axis_ratio(mut self, ratio: f64) -> Self {
        self.axis_ratio = ratio;
        self
    }
}

/// A touch position in page coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Scroll positions an inertia animation wants applied. Axes without inertia are `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InertiaFrame {
    pub scroll_left: Option<f64>,
    pub scroll_top: Option<f64>,
    pub done: bool,
}

/// Turns touch gestures into scroll deltas and inertia.
///
/// The controller calls these in event order and forwards the results to the escalator.
pub trait TouchTranslator {
    /// A touch began with `touches` fingers down. Returns whether the host should suppress its
    /// default handling.
    fn touch_start(&mut self, touches: usize, at: TouchPoint, now_ms: u64) -> bool;

    /// The primary finger moved. Returns `(dx, dy)` scroll deltas, if any.
    fn touch_move(&mut self, at: TouchPoint, now_ms: u64) -> Option<(f64, f64)>;

    /// The gesture ended at scroll position `scroll`. Returns whether an inertia animation
    /// started.
    fn touch_end(&mut self, scroll: ScrollState, now_ms: u64) -> bool;

    /// Advances a running inertia animation.
    fn step(&mut self, now_ms: u64) -> Option<InertiaFrame>;

    /// A finger is down.
    fn is_touching(&self) -> bool;

    fn is_animating(&self) -> bool;

    fn cancel(&mut self);
}

/// Velocity sampling for one axis.
#[derive(Clone, Debug, Default)]
struct Movement {
    /// Newest first.
    speeds: Vec<f64>,
    prev_pos: f64,
    prev_ms: u64,
    velocity: f64,
    delta: f64,
    position: f64,
    offset: f64,
    run: bool,
}

impl Movement {
    fn start(&mut self, pos: f64, now_ms: u64) {
        self.speeds.clear();
        self.prev_pos = pos;
        self.prev_ms = now_ms;
        self.velocity = 0.0;
        self.delta = 0.0;
    }

    fn moved(&mut self, pos: f64, now_ms: u64, options: &TouchOptions) {
        self.delta = self.prev_pos - pos;
        let elapsed = now_ms.saturating_sub(self.prev_ms).max(1) as f64;
        self.velocity = self.delta / elapsed;
        // A slow sample restarts the average so a fling measures only its fast part.
        if self.speeds.first().is_some_and(|s| !valid_speed(*s, options)) {
            self.speeds.clear();
        }
        self.speeds.insert(0, self.velocity);
        self.prev_ms = now_ms;
        self.prev_pos = pos;
    }

    fn end(&mut self, position: f64, acceleration: f64, options: &TouchOptions) {
        self.velocity = if self.speeds.is_empty() {
            0.0
        } else {
            self.speeds.iter().sum::<f64>() / self.speeds.len() as f64
        };
        self.position = position;
        self.offset = options.velocity_factor
            * self.velocity
            * acceleration
            * ease_in_out_cos(self.velocity, options.max_velocity);
        self.run = valid_speed(self.velocity, options);
    }

    /// Whether this axis is dominant enough relative to `other`.
    fn dominates(&self, other_velocity: f64, options: &TouchOptions) -> bool {
        other_velocity == 0.0 || (self.velocity / other_velocity).abs() >= options.axis_ratio
    }

    fn stop(&mut self) {
        self.delta = 0.0;
        self.offset = 0.0;
        self.run = false;
    }

    fn at(&self, progress: f64) -> Option<f64> {
        self.run.then(|| self.position + self.offset * progress)
    }
}

fn valid_speed(speed: f64, options: &TouchOptions) -> bool {
    speed.abs() > options.min_velocity
}

fn ease_in_out_cos(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 1.0;
    }
    0.5 - 0.5 * (core::f64::consts::PI * value.abs().min(max) / max).cos()
}

fn ease_out_exp(delta: f64) -> f64 {
    1.0 - 2f64.powf(-delta / 1000.0)
}

/// Drag scrolling with inertial deceleration after release.
///
/// While dragging, only the faster axis moves. On release each axis averages its recent
/// speeds; a fast enough axis keeps moving by an offset proportional to that speed and eases
/// out over a duration that grows with the distance. Touching again during the animation
/// stops it and compounds the acceleration of the next fling.
#[derive(Clone, Debug)]
pub struct InertialTouch {
    options: TouchOptions,
    x: Movement,
    y: Movement,
    acceleration: f64,
    touching: bool,
    animation: Option<Tween>,
}

impl Default for InertialTouch {
    fn default() -> Self {
        Self::new(TouchOptions::default())
    }
}

impl InertialTouch {
    pub fn new(options: TouchOptions) -> Self {
        Self {
            options,
            x: Movement::default(),
            y: Movement::default(),
            acceleration: 1.0,
            touching: false,
            animation: None,
        }
    }

    pub fn options(&self) -> &TouchOptions {
        &self.options
    }

    /// Multiplier applied to the next inertia offset.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    fn validate_axes(&mut self) {
        let (vx, vy) = (self.x.velocity, self.y.velocity);
        if !self.x.run || !self.x.dominates(vy, &self.options) {
            self.x.stop();
        }
        if !self.y.run || !self.y.dominates(vx, &self.options) {
            self.y.stop();
        }
    }
}

impl TouchTranslator for InertialTouch {
    fn touch_start(&mut self, touches: usize, at: TouchPoint, now_ms: u64) -> bool {
        if touches != 1 {
            vdebug!(touches, "multi-touch, inertia reset");
            self.touching = false;
            self.animation = None;
            self.acceleration = 1.0;
            return false;
        }
        let interrupted = self.animation.take().is_some();
        if interrupted {
            self.acceleration += self.options.acceleration_step;
        } else {
            self.acceleration = 1.0;
        }
        self.x.start(at.x, now_ms);
        self.y.start(at.y, now_ms);
        self.touching = true;
        interrupted
    }

    fn touch_move(&mut self, at: TouchPoint, now_ms: u64) -> Option<(f64, f64)> {
        if !self.touching {
            return None;
        }
        self.x.moved(at.x, now_ms, &self.options);
        self.y.moved(at.y, now_ms, &self.options);
        let dx = if self.x.dominates(self.y.velocity, &self.options) {
            self.x.delta
        } else {
            0.0
        };
        let dy = if self.y.dominates(self.x.velocity, &self.options) {
            self.y.delta
        } else {
            0.0
        };
        Some((dx, dy))
    }

    fn touch_end(&mut self, scroll: ScrollState, now_ms: u64) -> bool {
        if !self.touching {
            return false;
        }
        self.touching = false;
        self.x.end(scroll.scroll_left, self.acceleration, &self.options);
        self.y.end(scroll.scroll_top, self.acceleration, &self.options);
        self.validate_axes();
        if !self.x.run && !self.y.run {
            return false;
        }

        let vertical = !self.x.run || (self.y.run && self.y.offset.abs() > self.x.offset.abs());
        let distance = if vertical { self.y.offset } else { self.x.offset }.abs();
        let duration = (3.0 * self.options.duration_ms as f64 * ease_out_exp(distance)) as u64;
        vtrace!(
            vx = self.x.velocity,
            vy = self.y.velocity,
            distance,
            duration,
            "inertia"
        );
        self.animation = Some(Tween::new(0.0, 1.0, now_ms, duration, Easing::EaseOutCirc));
        true
    }

    fn step(&mut self, now_ms: u64) -> Option<InertiaFrame> {
        let animation = self.animation?;
        let progress = animation.sample(now_ms);
        let done = animation.is_done(now_ms);
        if done {
            self.animation = None;
        }
        Some(InertiaFrame {
            scroll_left: self.x.at(progress),
            scroll_top: self.y.at(progress),
            done,
        })
    }

    fn is_touching(&self) -> bool {
        self.touching
    }

    fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    fn cancel(&mut self) {
        self.touching = false;
        self.animation = None;
    }
}
