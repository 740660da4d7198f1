//! Step observer trait for monitoring skirt simulation progress.

/// Trait for observing the phases of one skirt step.
///
/// Hooks fire in phase order. All methods default to no-ops, so an observer
/// only implements what it cares about (debug overlays, counters, profiling).
pub trait StepObserver {
    /// Shape and elastic forces have been accumulated.
    fn on_forces(&mut self) {}

    /// Free particles have been integrated.
    fn on_integrate(&mut self) {}

    /// Stretch limits were enforced; `corrections` springs were over length.
    fn on_stretch_limits(&mut self, _corrections: usize) {}

    /// Collision resolution finished with `contacts` edge/volume penetrations.
    fn on_collisions(&mut self, _contacts: usize) {}

    /// The step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// Observer that ignores every hook.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}
