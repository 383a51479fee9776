//! Trigger bindings polled at the start of every tick.
//!
//! A binding pairs a boolean condition (a joystick button, an operator-panel
//! switch, a sensor threshold) with an action to run on the condition's rising
//! edge. The edge-detection state lives here; what the action does — usually a
//! `schedule` or `cancel` call — is the caller's business.

use crate::scheduler::Scheduler;

type Condition = Box<dyn FnMut() -> bool>;
type Action = Box<dyn FnMut(&mut Scheduler)>;

struct Binding {
    condition: Condition,
    action: Action,
    previous: bool,
}

/// Polled collection of rising-edge bindings.
///
/// The scheduler polls its event loop once per tick, before any lifecycle
/// pass, so actions see the scheduler in its between-ticks state and their
/// schedule/cancel calls apply synchronously.
#[derive(Default)]
pub struct EventLoop {
    bindings: Vec<Binding>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action to run whenever `condition` transitions from false
    /// to true between polls.
    pub fn bind(
        &mut self,
        condition: impl FnMut() -> bool + 'static,
        action: impl FnMut(&mut Scheduler) + 'static,
    ) {
        self.bindings.push(Binding {
            condition: Box::new(condition),
            action: Box::new(action),
            previous: false,
        });
    }

    /// Drop all bindings.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Evaluate every condition and run actions for rising edges.
    pub(crate) fn poll(&mut self, scheduler: &mut Scheduler) {
        for binding in &mut self.bindings {
            let current = (binding.condition)();
            if current && !binding.previous {
                (binding.action)(scheduler);
            }
            binding.previous = current;
        }
    }

    /// Absorb bindings registered while this loop was checked out of the
    /// scheduler (an action binding further actions).
    pub(crate) fn absorb(&mut self, other: EventLoop) {
        self.bindings.extend(other.bindings);
    }
}
