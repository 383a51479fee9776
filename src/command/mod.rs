//! Command contract and building blocks.
//!
//! This module provides:
//! - **Command**: the polymorphic behavioral unit the scheduler drives through
//!   its lifecycle (initialize → execute per tick → end).
//! - **InterruptionPolicy**: how a running command reacts when another command
//!   requests one of its claimed subsystems.
//! - **FunctionalCommand**: a closure-backed implementation for one-off
//!   behaviors and tests.

mod functional;

pub use functional::FunctionalCommand;

use crate::id::SubsystemId;
use crate::scheduler::Scheduler;

/// What happens to a running command when a *different* command requests one
/// of its claimed subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptionPolicy {
    /// Yield: this command is force-exited (`end(true)`) and the incoming
    /// command takes the claim.
    #[default]
    InterruptSelf,
    /// Block: the incoming schedule attempt is rejected and this command
    /// keeps running.
    InterruptIncoming,
}

/// A schedulable unit of robot behavior.
///
/// Lifecycle: Idle → Running → Idle. Entering Running calls `initialize`
/// exactly once; while Running, `execute` is called once per tick; leaving
/// Running calls `end(interrupted)` exactly once, with `interrupted == false`
/// only when `is_finished` returned true on that same tick.
///
/// Callbacks receive the owning [`Scheduler`] so a command can chain follow-up
/// work (schedule the next step, cancel a sibling). Calls made from inside a
/// callback are deferred and replayed after the current tick's passes
/// complete; see the scheduler module docs.
pub trait Command {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str {
        "command"
    }

    /// Subsystems this command must exclusively hold while running. Fixed for
    /// the command's lifetime; the scheduler queries it, never mutates it.
    fn requirements(&self) -> &[SubsystemId] {
        &[]
    }

    /// Reaction to a conflicting schedule request while this command runs.
    fn interruption_policy(&self) -> InterruptionPolicy {
        InterruptionPolicy::InterruptSelf
    }

    /// Whether this command may be admitted and keep running while the
    /// scheduler is disabled.
    fn runs_while_disabled(&self) -> bool {
        false
    }

    /// Called exactly once when the command enters Running.
    fn initialize(&mut self, scheduler: &mut Scheduler) {
        let _ = scheduler;
    }

    /// Called once per tick while the command is Running.
    fn execute(&mut self, scheduler: &mut Scheduler) {
        let _ = scheduler;
    }

    /// Called exactly once when the command leaves Running.
    ///
    /// `interrupted` is false only for natural completion (`is_finished`
    /// returned true this tick); every other exit — preemption, explicit
    /// cancel, disable sweep — passes true.
    fn end(&mut self, scheduler: &mut Scheduler, interrupted: bool) {
        let _ = scheduler;
        let _ = interrupted;
    }

    /// Checked after `execute` each tick; returning true triggers natural
    /// completion.
    fn is_finished(&mut self) -> bool {
        false
    }
}
