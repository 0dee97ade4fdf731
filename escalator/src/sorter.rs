/// Identifies one animation frame request issued by the escalator.
///
/// The host hands the ticket back through `Escalator::on_animation_frame`. Tickets from a
/// superseded request are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameTicket(pub(crate) u64);

impl FrameTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What the escalator should do after a frame was delivered to the sorter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SortStep {
    /// The ticket is stale or nothing is scheduled.
    Ignore,
    /// Conditions are not met yet; request the enclosed frame.
    Wait(FrameTicket),
    /// Sort the body now.
    Sort,
}

/// Debounces the physical reordering of body rows.
///
/// Every reschedule bumps the generation, which invalidates all outstanding frame tickets. A
/// sort runs once enough frames and enough time have passed since the last reschedule, and
/// never while a touch gesture is active.
#[derive(Clone, Debug)]
pub(crate) struct DeferredSorter {
    generation: u64,
    waiting: bool,
    frames_passed: u32,
    start_ms: Option<u64>,
    delay_ms: u64,
    required_frames: u32,
}

impl DeferredSorter {
    pub(crate) fn new(delay_ms: u64, required_frames: u32) -> Self {
        Self {
            generation: 0,
            waiting: false,
            frames_passed: 0,
            start_ms: None,
            delay_ms,
            required_frames,
        }
    }

    /// Invalidates any pending request and returns the ticket to request next.
    pub(crate) fn reschedule(&mut self) -> FrameTicket {
        self.generation = self.generation.wrapping_add(1);
        self.waiting = true;
        self.frames_passed = 0;
        self.start_ms = None;
        FrameTicket(self.generation)
    }

    pub(crate) fn on_frame(&mut self, ticket: FrameTicket, now_ms: u64, touching: bool) -> SortStep {
        if !self.waiting || ticket.0 != self.generation {
            return SortStep::Ignore;
        }
        self.frames_passed = self.frames_passed.saturating_add(1);
        // The clock starts with the first delivered frame.
        let start = *self.start_ms.get_or_insert(now_ms);
        let enough_frames = self.frames_passed >= self.required_frames;
        let enough_time = now_ms.saturating_sub(start) >= self.delay_ms;
        if enough_frames && enough_time && !touching {
            self.waiting = false;
            self.frames_passed = 0;
            self.start_ms = None;
            SortStep::Sort
        } else {
            SortStep::Wait(ticket)
        }
    }

    /// Drops any scheduled sort, e.g. after sorting synchronously.
    pub(crate) fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.waiting = false;
    }

    pub(crate) fn is_waiting(&self) -> bool {
        self.waiting
    }
}
