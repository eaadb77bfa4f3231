//! Frame clock with delta clamping

use std::time::Instant;

/// Largest delta handed to the simulation (two frames at 60Hz)
pub const DEFAULT_MAX_DELTA: f64 = 0.033;

/// Tracks frame time for a render-loop driven simulation
pub struct FrameClock {
    /// Total simulated time in seconds (sum of clamped deltas)
    pub total_time: f64,
    /// Clamped time since last frame in seconds
    pub delta_time: f64,
    /// Upper bound applied to every delta
    pub max_delta: f64,
    /// Number of frames advanced
    pub frame_count: u64,
    /// Last tick instant
    last_instant: Instant,
    /// Whether this is the first tick
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            max_delta: DEFAULT_MAX_DELTA,
            frame_count: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    /// Create a new frame clock with the default delta clamp
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame clock with a custom delta clamp in seconds
    pub fn with_max_delta(max_delta: f64) -> Self {
        Self {
            max_delta: max_delta.max(0.0),
            ..Self::default()
        }
    }

    /// Clamp a raw frame delta into `[0, max_delta]`. NaN becomes zero.
    pub fn clamp_delta(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(0.0, self.max_delta)
    }

    /// Advance from wall-clock time. Call once per frame.
    ///
    /// The first tick yields a zero delta; a tab resumed after being
    /// backgrounded yields at most `max_delta`.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return 0.0;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(elapsed)
    }

    /// Advance by an explicit delta (headless runs and tests)
    pub fn advance(&mut self, raw: f64) -> f64 {
        self.delta_time = self.clamp_delta(raw);
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }
}
