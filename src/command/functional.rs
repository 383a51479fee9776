//! Closure-backed command implementation.

use crate::command::{Command, InterruptionPolicy};
use crate::id::SubsystemId;
use crate::scheduler::Scheduler;

type InitFn = Box<dyn FnMut(&mut Scheduler)>;
type ExecuteFn = Box<dyn FnMut(&mut Scheduler)>;
type EndFn = Box<dyn FnMut(&mut Scheduler, bool)>;
type FinishedFn = Box<dyn FnMut() -> bool>;

/// A [`Command`] assembled from closures.
///
/// Useful for one-off behaviors that do not warrant a dedicated type, and for
/// tests. Unset callbacks default to no-ops; an unset finish predicate means
/// the command runs until cancelled or preempted.
pub struct FunctionalCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    policy: InterruptionPolicy,
    runs_while_disabled: bool,
    on_initialize: Option<InitFn>,
    on_execute: Option<ExecuteFn>,
    on_end: Option<EndFn>,
    finished: Option<FinishedFn>,
}

impl FunctionalCommand {
    /// Create a command with the given name and requirement set and no
    /// behavior. Attach callbacks with the `with_` builders.
    pub fn new(name: impl Into<String>, requirements: Vec<SubsystemId>) -> Self {
        Self {
            name: name.into(),
            requirements,
            policy: InterruptionPolicy::default(),
            runs_while_disabled: false,
            on_initialize: None,
            on_execute: None,
            on_end: None,
            finished: None,
        }
    }

    /// A command that performs its work in `initialize` and finishes on the
    /// first `is_finished` check.
    pub fn instant(
        name: impl Into<String>,
        requirements: Vec<SubsystemId>,
        action: impl FnMut(&mut Scheduler) + 'static,
    ) -> Self {
        Self::new(name, requirements)
            .with_initialize(action)
            .with_finished(|| true)
    }

    /// A command that calls `action` every tick and never finishes on its own.
    pub fn run_forever(
        name: impl Into<String>,
        requirements: Vec<SubsystemId>,
        action: impl FnMut(&mut Scheduler) + 'static,
    ) -> Self {
        Self::new(name, requirements).with_execute(action)
    }

    /// Set the initialize callback.
    pub fn with_initialize(mut self, f: impl FnMut(&mut Scheduler) + 'static) -> Self {
        self.on_initialize = Some(Box::new(f));
        self
    }

    /// Set the per-tick execute callback.
    pub fn with_execute(mut self, f: impl FnMut(&mut Scheduler) + 'static) -> Self {
        self.on_execute = Some(Box::new(f));
        self
    }

    /// Set the end callback; the bool argument is the interrupted flag.
    pub fn with_end(mut self, f: impl FnMut(&mut Scheduler, bool) + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    /// Set the finish predicate.
    pub fn with_finished(mut self, f: impl FnMut() -> bool + 'static) -> Self {
        self.finished = Some(Box::new(f));
        self
    }

    /// Set the interruption policy.
    pub fn with_policy(mut self, policy: InterruptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Allow this command to be admitted and keep running while disabled.
    pub fn with_runs_while_disabled(mut self, runs: bool) -> Self {
        self.runs_while_disabled = runs;
        self
    }
}

impl Command for FunctionalCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn interruption_policy(&self) -> InterruptionPolicy {
        self.policy
    }

    fn runs_while_disabled(&self) -> bool {
        self.runs_while_disabled
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) {
        if let Some(f) = self.on_initialize.as_mut() {
            f(scheduler);
        }
    }

    fn execute(&mut self, scheduler: &mut Scheduler) {
        if let Some(f) = self.on_execute.as_mut() {
            f(scheduler);
        }
    }

    fn end(&mut self, scheduler: &mut Scheduler, interrupted: bool) {
        if let Some(f) = self.on_end.as_mut() {
            f(scheduler, interrupted);
        }
    }

    fn is_finished(&mut self) -> bool {
        match self.finished.as_mut() {
            Some(f) => f(),
            None => false,
        }
    }
}
