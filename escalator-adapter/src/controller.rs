use escalator::{
    Escalator, EscalatorOptions, FrameTicket, Result, ScrollDestination, ScrollState, Surface,
    WheelDeltaMode,
};

use crate::{Easing, InertialTouch, TouchPoint, TouchTranslator, Tween, WheelOptions};

/// A framework-neutral controller that wraps an [`Escalator`] and routes host input to it:
/// wheel events, touch gestures with inertia, and tween-driven programmatic scrolling.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_wheel` / `on_touch_*` when input events occur
/// - `on_animation_frame` for the frames the escalator requested from the surface
/// - `tick(now_ms)` each frame/timer tick (for inertia and tween scrolling)
///
/// Touch physics are pluggable through [`TouchTranslator`].
pub struct Controller<S: Surface, T: TouchTranslator = InertialTouch> {
    escalator: Escalator<S>,
    touch: T,
    wheel: WheelOptions,
    tween: Option<Tween>,
}

impl<S: Surface> Controller<S> {
    pub fn new(surface: S, options: EscalatorOptions) -> Self {
        Self::from_escalator(Escalator::new(surface, options))
    }

    pub fn from_escalator(escalator: Escalator<S>) -> Self {
        Self::with_touch(escalator, InertialTouch::default())
    }
}

impl<S: Surface, T: TouchTranslator> Controller<S, T> {
    pub fn with_touch(escalator: Escalator<S>, touch: T) -> Self {
        Self {
            escalator,
            touch,
            wheel: WheelOptions::default(),
            tween: None,
        }
    }

    pub fn with_wheel_options(mut self, wheel: WheelOptions) -> Self {
        self.wheel = wheel;
        self
    }

    pub fn escalator(&self) -> &Escalator<S> {
        &self.escalator
    }

    pub fn escalator_mut(&mut self) -> &mut Escalator<S> {
        &mut self.escalator
    }

    pub fn into_escalator(self) -> Escalator<S> {
        self.escalator
    }

    pub fn touch(&self) -> &T {
        &self.touch
    }

    pub fn wheel_options(&self) -> &WheelOptions {
        &self.wheel
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some() || self.touch.is_animating()
    }

    pub fn cancel_animation(&mut self) {
        self.tween = None;
        if self.touch.is_animating() {
            self.touch.cancel();
            self.sync_touch();
        }
    }

    /// Applies a wheel event. Returns whether the host should suppress its default handling.
    ///
    /// This cancels any active tween.
    pub fn on_wheel(&mut self, dx: f64, dy: f64, mode: WheelDeltaMode) -> bool {
        self.tween = None;
        let (dx, dy) = self.wheel.normalize(dx, dy);
        self.escalator.on_wheel(dx, dy, mode)
    }

    /// Call this when the UI reports a scrollbar drag.
    ///
    /// This cancels any active tween.
    pub fn on_scroll(&mut self, scroll: ScrollState) {
        self.tween = None;
        self.escalator.restore_scroll_state(scroll);
    }

    pub fn on_touch_start(&mut self, touches: usize, at: TouchPoint, now_ms: u64) -> bool {
        self.tween = None;
        let suppress = self.touch.touch_start(touches, at, now_ms);
        self.sync_touch();
        suppress
    }

    /// Returns whether the movement scrolled.
    pub fn on_touch_move(&mut self, at: TouchPoint, now_ms: u64) -> bool {
        match self.touch.touch_move(at, now_ms) {
            Some((dx, dy)) => self.escalator.scroll_by(dx, dy),
            None => false,
        }
    }

    /// Returns whether an inertia animation started; drive it with [`Controller::tick`].
    pub fn on_touch_end(&mut self, now_ms: u64) -> bool {
        let started = self.touch.touch_end(self.escalator.scroll_state(), now_ms);
        self.sync_touch();
        started
    }

    /// Forwards an animation frame requested by the escalator.
    pub fn on_animation_frame(&mut self, ticket: FrameTicket, now_ms: u64) {
        self.escalator.on_animation_frame(ticket, now_ms);
    }

    /// Advances inertia and tweens.
    ///
    /// Returns the new scroll state when anything moved, `None` when idle.
    pub fn tick(&mut self, now_ms: u64) -> Option<ScrollState> {
        let mut moved = false;

        if let Some(frame) = self.touch.step(now_ms) {
            let mut state = self.escalator.scroll_state();
            if let Some(left) = frame.scroll_left {
                state.scroll_left = left;
            }
            if let Some(top) = frame.scroll_top {
                state.scroll_top = top;
            }
            self.escalator.restore_scroll_state(state);
            if frame.done {
                self.sync_touch();
            }
            moved = true;
        }

        if let Some(tween) = self.tween {
            self.escalator.set_scroll_top(tween.sample(now_ms));
            if tween.is_done(now_ms) {
                self.tween = None;
            }
            moved = true;
        }

        moved.then(|| self.escalator.scroll_state())
    }

    /// Starts a tween that scrolls body row `row` to `destination`.
    ///
    /// Returns the clamped target `scroll_top`.
    pub fn start_tween_to_row(
        &mut self,
        row: usize,
        destination: ScrollDestination,
        padding: f64,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> Result<f64> {
        let to = self.escalator.scroll_to_row_offset(row, destination, padding)?;
        Ok(self.start_tween_to_offset(to, now_ms, duration_ms, easing))
    }

    /// Starts a tween to a `scroll_top`.
    ///
    /// Returns the clamped target.
    pub fn start_tween_to_offset(
        &mut self,
        scroll_top: f64,
        now_ms: u64,
        duration_ms: u64,
        easing: Easing,
    ) -> f64 {
        let max = self.escalator.vertical_scrollbar().max_scroll_pos();
        let to = scroll_top.min(max).max(0.0);
        let from = self.escalator.scroll_top();
        match &mut self.tween {
            Some(tween) => tween.retarget(now_ms, to, duration_ms),
            None => self.tween = Some(Tween::new(from, to, now_ms, duration_ms, easing)),
        }
        vdebug!(from, to, duration_ms, "tween");
        to
    }

    fn sync_touch(&mut self) {
        let active = self.touch.is_touching() || self.touch.is_animating();
        self.escalator.set_touch_active(active);
    }
}

impl<S: Surface, T: TouchTranslator + core::fmt::Debug> core::fmt::Debug
    for Controller<S, T>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("escalator", &self.escalator)
            .field("touch", &self.touch)
            .field("wheel", &self.wheel)
            .field("tween", &self.tween)
            .finish()
    }
}
