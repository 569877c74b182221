/// Frame clock handed to game code.
///
/// `delta` is scaled by `time_scale`; the physics step uses the scaled delta,
/// so a scale of zero pauses the simulation while the frame loop keeps running.
#[derive(Debug, Clone)]
pub struct Time {
    unscaled_delta: f32,
    time_scale: f32,
    total: f64,
    unscaled_total: f64,
}

impl Time {
    pub fn new() -> Self {
        Self {
            unscaled_delta: 0.0,
            time_scale: 1.0,
            total: 0.0,
            unscaled_total: 0.0,
        }
    }

    /// Advance the clock by one frame of `dt` real seconds.
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.unscaled_delta = dt;
        self.total += (dt * self.time_scale) as f64;
        self.unscaled_total += dt as f64;
    }

    /// Scaled seconds elapsed this frame.
    pub fn delta(&self) -> f32 {
        self.unscaled_delta * self.time_scale
    }

    pub fn unscaled_delta(&self) -> f32 {
        self.unscaled_delta
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative scales are clamped to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Scaled seconds since the engine started.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn unscaled_total(&self) -> f64 {
        self.unscaled_total
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frames a host may owe after one long stall; older backlog is dropped.
pub const MAX_CATCH_UP_FRAMES: u32 = 10;

/// Turns variable host frame times into a count of whole engine frames.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    frame_dt: f32,
    max_frames: u32,
    backlog: f32,
}

impl FrameAccumulator {
    pub fn new(frame_dt: f32) -> Self {
        Self::with_max_frames(frame_dt, MAX_CATCH_UP_FRAMES)
    }

    pub fn with_max_frames(frame_dt: f32, max_frames: u32) -> Self {
        Self {
            frame_dt,
            max_frames: max_frames.max(1),
            backlog: 0.0,
        }
    }

    /// Add `elapsed` host seconds and return how many frames are now due.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if self.frame_dt <= 0.0 {
            return 0;
        }
        let limit = self.frame_dt * self.max_frames as f32;
        self.backlog = (self.backlog + elapsed.max(0.0)).min(limit);
        let due = (self.backlog / self.frame_dt) as u32;
        self.backlog -= due as f32 * self.frame_dt;
        due
    }

    /// Seconds in one engine frame.
    pub fn frame_dt(&self) -> f32 {
        self.frame_dt
    }
}
