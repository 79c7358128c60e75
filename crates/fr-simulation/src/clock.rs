/// Tracks simulation time: a monotonic tick counter and the elapsed seconds
/// it implies.
///
/// Elapsed time is derived from the tick count rather than accumulated, so
/// the same tick always maps to the same instant.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    seconds_per_tick: f64,
}

impl SimClock {
    /// Create a new clock starting at tick 0.
    pub fn new(seconds_per_tick: f64) -> Self {
        Self {
            tick: 0,
            seconds_per_tick,
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since the start.
    pub fn elapsed(&self) -> f64 {
        self.tick as f64 * self.seconds_per_tick
    }

    /// Duration of one tick in seconds.
    pub fn dt(&self) -> f64 {
        self.seconds_per_tick
    }
}
