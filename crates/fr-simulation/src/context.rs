use fr_core::World;
use rand::Rng;
use rand::rngs::StdRng;

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::event::{EventLog, SimEvent, SimEventKind};

/// Mutable context passed to each system during a tick, and to the action
/// executor for each command.
pub struct SimContext<'a> {
    /// The registry being simulated.
    pub world: &'a mut World,
    /// Current simulated time.
    pub clock: &'a SimClock,
    /// Sink for emitted events.
    pub events: &'a mut EventLog,
    /// The run's seeded RNG. Every random draw goes through it.
    pub rng: &'a mut StdRng,
    /// Run-wide settings.
    pub config: &'a SimConfig,
}

impl SimContext<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// Current tick number.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Simulated seconds since the start.
    pub fn now(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Uniform sample from `[-extent, extent]`; zero for a non-positive extent.
    pub fn jitter(&mut self, extent: f32) -> f32 {
        if extent > 0.0 {
            self.rng.random_range(-extent..=extent)
        } else {
            0.0
        }
    }
}
