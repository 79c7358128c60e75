use crate::context::SimContext;
use crate::error::SimResult;

/// A stage of the per-tick pipeline.
///
/// The orchestrator runs stages in registration order; the default setup is
/// movement, then observability, then dynamics, so reveals see this tick's
/// positions and spawns land after both. A stage that returns `Err` stops
/// the tick.
pub trait System: std::fmt::Debug {
    /// Stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Advance this stage by one tick. The clock has already advanced.
    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()>;

    /// Runs once, before the first tick or command.
    fn init(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Downcast support for [`Simulation::get_system`](crate::Simulation::get_system).
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast support for [`Simulation::get_system_mut`](crate::Simulation::get_system_mut).
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
