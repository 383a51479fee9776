//! Subsystem contract
//!
//! A subsystem models exclusive ownership of a piece of hardware (a
//! drivetrain, an arm, a shooter). The scheduler guarantees that at most one
//! live command holds a claim on a subsystem at any observable point between
//! ticks; the subsystem itself carries no scheduling state.

/// An exclusive-access handle to a physical or simulated resource.
///
/// Register implementations with
/// [`Scheduler::register_subsystem`](crate::scheduler::Scheduler::register_subsystem)
/// to receive a [`SubsystemId`](crate::id::SubsystemId). Commands name the
/// subsystems they need through their requirement set; the scheduler
/// arbitrates conflicting claims.
pub trait Subsystem {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// Hardware housekeeping hook, called once per tick after the execute
    /// pass, in registration order. Runs regardless of whether any command
    /// currently claims this subsystem.
    fn periodic(&mut self) {}
}
