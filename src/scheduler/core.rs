//! The scheduler core: registries, resource arbitration, and the tick.

use std::collections::{HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::command::{Command, InterruptionPolicy};
use crate::error::{Result, SchedulerError};
use crate::id::{CommandId, SubsystemId};
use crate::scheduler::binding::EventLoop;
use crate::scheduler::events::{CommandEvent, CommandObserver, ObserverSet};
use crate::subsystem::Subsystem;

/// What happened to a schedule request.
///
/// None of these are errors: a blocked or suppressed request is a normal
/// outcome of resource arbitration, reported to the caller and to tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The command was admitted and initialized.
    Scheduled,
    /// A tick is in progress; the request was queued and will be applied
    /// after the current tick's passes complete.
    Deferred,
    /// The command is already running; nothing changed.
    AlreadyScheduled,
    /// A required subsystem is claimed by a command whose policy blocks
    /// incoming requests; nothing changed.
    Blocked,
    /// The scheduler is disabled and the command does not run while disabled.
    DisabledLockout,
    /// The id was never registered with this scheduler.
    NotRegistered,
}

struct SubsystemEntry {
    subsystem: Box<dyn Subsystem>,
    default_command: Option<CommandId>,
}

enum Invoke {
    Done,
    Faulted,
    Missing,
}

enum FinishCheck {
    Finished,
    Continuing,
    Faulted,
    Missing,
}

/// Cooperative command scheduler for a periodic control loop.
///
/// The scheduler owns every command and subsystem handed to it and addresses
/// them by id. An external driver calls [`run`](Scheduler::run) once per
/// control-loop period; everything else happens inside that call or through
/// the synchronous entry points between calls.
///
/// # Reentrancy
///
/// A command callback may call [`schedule`](Scheduler::schedule) or
/// [`cancel`](Scheduler::cancel) on the scheduler it was handed — commonly to
/// chain the next step of a sequence. While a tick or a synchronous lifecycle
/// operation is in progress those requests are queued, then replayed once the
/// passes complete: all pending cancels first, then all pending schedules, so
/// a command cancelled-then-rescheduled within one tick ends up scheduled.
/// Calling `run` from inside a callback is rejected with
/// [`SchedulerError::ReentrantRun`].
pub struct Scheduler {
    commands: HashMap<CommandId, Option<Box<dyn Command>>>,
    next_command_id: u64,
    /// Live commands in admission order.
    live: Vec<CommandId>,
    /// Exclusive owner of each claimed subsystem. Absent means free.
    claims: HashMap<SubsystemId, CommandId>,
    /// Registered subsystems; the index is the id and the iteration order.
    subsystems: Vec<SubsystemEntry>,
    enabled: bool,
    in_tick: bool,
    pending_schedule: VecDeque<CommandId>,
    pending_cancel: VecDeque<CommandId>,
    observers: ObserverSet,
    event_loop: EventLoop,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty, enabled scheduler.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            next_command_id: 0,
            live: Vec::new(),
            claims: HashMap::new(),
            subsystems: Vec::new(),
            enabled: true,
            in_tick: false,
            pending_schedule: VecDeque::new(),
            pending_cancel: VecDeque::new(),
            observers: ObserverSet::default(),
            event_loop: EventLoop::new(),
        }
    }

    // ---- registration ----

    /// Hand a command to the scheduler. The returned id is the command's
    /// identity for every later operation.
    pub fn register_command(&mut self, command: Box<dyn Command>) -> CommandId {
        let id = CommandId::new(self.next_command_id);
        self.next_command_id += 1;
        tracing::debug!(command = %id, name = command.name(), "command registered");
        self.commands.insert(id, Some(command));
        id
    }

    /// Register a subsystem with no default command.
    pub fn register_subsystem(&mut self, subsystem: Box<dyn Subsystem>) -> SubsystemId {
        let id = SubsystemId::new(self.subsystems.len());
        tracing::debug!(subsystem = %id, name = subsystem.name(), "subsystem registered");
        self.subsystems.push(SubsystemEntry {
            subsystem,
            default_command: None,
        });
        id
    }

    /// Assign the fallback command a subsystem runs whenever nothing else
    /// claims it. The command must require exactly that subsystem.
    pub fn set_default_command(
        &mut self,
        subsystem: SubsystemId,
        command: CommandId,
    ) -> Result<()> {
        if subsystem.index() >= self.subsystems.len() {
            return Err(SchedulerError::UnknownSubsystem(subsystem));
        }
        let requirements = self
            .command_requirements(command)
            .ok_or(SchedulerError::UnknownCommand(command))?;
        let exact = !requirements.is_empty() && requirements.iter().all(|&r| r == subsystem);
        if !exact {
            tracing::warn!(
                subsystem = %subsystem,
                command = %command,
                "default command rejected, requirement set mismatch"
            );
            return Err(SchedulerError::DefaultCommandRequirements { subsystem, command });
        }
        self.subsystems[subsystem.index()].default_command = Some(command);
        Ok(())
    }

    /// Clear a subsystem's default command. A currently-running instance is
    /// not cancelled.
    pub fn remove_default_command(&mut self, subsystem: SubsystemId) -> Result<()> {
        let entry = self
            .subsystems
            .get_mut(subsystem.index())
            .ok_or(SchedulerError::UnknownSubsystem(subsystem))?;
        entry.default_command = None;
        Ok(())
    }

    /// The subsystem's current default command, if any.
    pub fn default_command(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems
            .get(subsystem.index())
            .and_then(|entry| entry.default_command)
    }

    // ---- scheduling entry points ----

    /// Request that a command start running.
    ///
    /// Outside a tick this resolves synchronously: resource arbitration runs,
    /// conflicting `InterruptSelf` owners are force-exited, and on success the
    /// command is initialized before this returns. During a tick the request
    /// is queued and applied at the end of the same `run` call, evaluated
    /// against flush-time state.
    pub fn schedule(&mut self, id: CommandId) -> ScheduleOutcome {
        if self.in_tick {
            self.pending_schedule.push_back(id);
            return ScheduleOutcome::Deferred;
        }
        self.in_tick = true;
        let outcome = self.schedule_now(id);
        self.in_tick = false;
        self.flush_pending();
        outcome
    }

    /// Request that a running command stop with `end(interrupted = true)`.
    ///
    /// A command that is not running is ignored. During a tick the request is
    /// queued like [`schedule`](Scheduler::schedule).
    pub fn cancel(&mut self, id: CommandId) {
        if self.in_tick {
            self.pending_cancel.push_back(id);
            return;
        }
        self.in_tick = true;
        self.cancel_now(id);
        self.in_tick = false;
        self.flush_pending();
    }

    /// Cancel every live command, iterating a snapshot of the live set.
    pub fn cancel_all(&mut self) {
        let snapshot = self.live.clone();
        for id in snapshot {
            self.cancel(id);
        }
    }

    /// Feed the external enabled/disabled signal. Disabling takes effect via
    /// the disable sweep on the next tick, not instantaneously.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::info!(enabled, "scheduler enabled state changed");
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ---- the tick ----

    /// Run one control-loop period.
    ///
    /// Steps, in order: poll trigger bindings; disable sweep; default-command
    /// admission; execute pass over a snapshot of the live set; subsystem
    /// periodic pass; flush deferred cancels, then deferred schedules.
    ///
    /// Returns [`SchedulerError::ReentrantRun`] if called from inside a
    /// command callback.
    pub fn run(&mut self) -> Result<()> {
        if self.in_tick {
            return Err(SchedulerError::ReentrantRun);
        }

        // Binding actions run before the guard is set, so their
        // schedule/cancel calls apply synchronously.
        self.poll_bindings();
        self.in_tick = true;

        if !self.enabled {
            let doomed: Vec<CommandId> = self
                .live
                .iter()
                .copied()
                .filter(|&id| !self.command_runs_while_disabled(id).unwrap_or(false))
                .collect();
            for id in doomed {
                tracing::debug!(command = %id, "disable sweep interrupting command");
                self.interrupt_command(id);
            }
        }

        for index in 0..self.subsystems.len() {
            let subsystem = SubsystemId::new(index);
            if self.claims.contains_key(&subsystem) {
                continue;
            }
            let Some(default) = self.subsystems[index].default_command else {
                continue;
            };
            if self.live.contains(&default) {
                continue;
            }
            let _ = self.schedule_now(default);
        }

        let snapshot = self.live.clone();
        for id in snapshot {
            if !self.live.contains(&id) {
                continue;
            }
            match self.invoke(id, "execute", |command, scheduler| command.execute(scheduler)) {
                Invoke::Faulted => {
                    self.interrupt_command(id);
                    continue;
                }
                Invoke::Missing => continue,
                Invoke::Done => self.notify(CommandEvent::Executed, id),
            }
            match self.check_finished(id) {
                FinishCheck::Finished => {
                    let _ = self.invoke(id, "end", |command, scheduler| {
                        command.end(scheduler, false)
                    });
                    self.notify(CommandEvent::Finished, id);
                    self.release(id);
                    tracing::debug!(command = %id, "command finished");
                }
                FinishCheck::Faulted => self.interrupt_command(id),
                FinishCheck::Continuing | FinishCheck::Missing => {}
            }
        }

        for entry in &mut self.subsystems {
            entry.subsystem.periodic();
        }

        self.in_tick = false;
        self.flush_pending();
        Ok(())
    }

    // ---- queries ----

    /// Whether the command is currently live.
    pub fn is_scheduled(&self, id: CommandId) -> bool {
        self.live.contains(&id)
    }

    /// Live commands in admission order.
    pub fn live_commands(&self) -> &[CommandId] {
        &self.live
    }

    /// The command currently holding an exclusive claim on the subsystem.
    pub fn requiring(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.claims.get(&subsystem).copied()
    }

    /// Iterate the current (subsystem, owner) claims.
    pub fn claims(&self) -> impl Iterator<Item = (SubsystemId, CommandId)> + '_ {
        self.claims.iter().map(|(&s, &c)| (s, c))
    }

    /// Name of a registered command.
    pub fn command_name(&self, id: CommandId) -> Option<&str> {
        self.commands
            .get(&id)
            .and_then(|slot| slot.as_deref())
            .map(|command| command.name())
    }

    /// Name of a registered subsystem.
    pub fn subsystem_name(&self, id: SubsystemId) -> Option<&str> {
        self.subsystems
            .get(id.index())
            .map(|entry| entry.subsystem.name())
    }

    /// Requirement set of a registered command.
    pub fn command_requirements(&self, id: CommandId) -> Option<Vec<SubsystemId>> {
        self.commands
            .get(&id)
            .and_then(|slot| slot.as_deref())
            .map(|command| command.requirements().to_vec())
    }

    // ---- observers ----

    /// Observe every command initialization, in registration order.
    pub fn on_command_initialize(
        &mut self,
        observer: impl FnMut(CommandId, &dyn Command) + 'static,
    ) {
        self.push_observer(CommandEvent::Initialized, Box::new(observer));
    }

    /// Observe every command execution.
    pub fn on_command_execute(&mut self, observer: impl FnMut(CommandId, &dyn Command) + 'static) {
        self.push_observer(CommandEvent::Executed, Box::new(observer));
    }

    /// Observe every command interruption (any non-natural exit).
    pub fn on_command_interrupt(
        &mut self,
        observer: impl FnMut(CommandId, &dyn Command) + 'static,
    ) {
        self.push_observer(CommandEvent::Interrupted, Box::new(observer));
    }

    /// Observe every natural completion.
    pub fn on_command_finish(&mut self, observer: impl FnMut(CommandId, &dyn Command) + 'static) {
        self.push_observer(CommandEvent::Finished, Box::new(observer));
    }

    // ---- bindings ----

    /// Register a rising-edge trigger binding, polled at the start of every
    /// tick.
    pub fn bind(
        &mut self,
        condition: impl FnMut() -> bool + 'static,
        action: impl FnMut(&mut Scheduler) + 'static,
    ) {
        self.event_loop.bind(condition, action);
    }

    /// Drop all trigger bindings.
    pub fn clear_bindings(&mut self) {
        self.event_loop.clear();
    }

    // ---- internals ----

    fn push_observer(&mut self, event: CommandEvent, observer: CommandObserver) {
        self.observers.push(event, observer);
    }

    /// Synchronous admission path: arbitration, claim, initialize.
    fn schedule_now(&mut self, id: CommandId) -> ScheduleOutcome {
        if self.live.contains(&id) {
            tracing::trace!(command = %id, "schedule ignored, already running");
            return ScheduleOutcome::AlreadyScheduled;
        }
        let Some(command) = self.commands.get(&id).and_then(|slot| slot.as_deref()) else {
            tracing::warn!(command = %id, "schedule ignored, command not registered");
            return ScheduleOutcome::NotRegistered;
        };
        if !self.enabled && !command.runs_while_disabled() {
            tracing::debug!(command = %id, "schedule suppressed while disabled");
            return ScheduleOutcome::DisabledLockout;
        }
        let requirements: Vec<SubsystemId> = command.requirements().to_vec();

        // Arbitration: collect every InterruptSelf owner first; one
        // InterruptIncoming owner aborts the whole attempt with no partial
        // claims.
        let mut to_interrupt: Vec<CommandId> = Vec::new();
        for &subsystem in &requirements {
            let Some(&owner) = self.claims.get(&subsystem) else {
                continue;
            };
            match self.command_policy(owner).unwrap_or_default() {
                InterruptionPolicy::InterruptSelf => {
                    if !to_interrupt.contains(&owner) {
                        to_interrupt.push(owner);
                    }
                }
                InterruptionPolicy::InterruptIncoming => {
                    tracing::debug!(
                        command = %id,
                        owner = %owner,
                        subsystem = %subsystem,
                        "schedule blocked by running command"
                    );
                    return ScheduleOutcome::Blocked;
                }
            }
        }

        // An interrupted owner releases all of its claims, not just the
        // contested one.
        for owner in to_interrupt {
            tracing::debug!(owner = %owner, incoming = %id, "interrupting command for its claims");
            self.interrupt_command(owner);
        }

        for &subsystem in &requirements {
            self.claims.insert(subsystem, id);
        }
        self.live.push(id);
        tracing::debug!(command = %id, "command scheduled");

        match self.invoke(id, "initialize", |command, scheduler| {
            command.initialize(scheduler)
        }) {
            Invoke::Faulted => self.interrupt_command(id),
            Invoke::Missing => {}
            Invoke::Done => self.notify(CommandEvent::Initialized, id),
        }
        ScheduleOutcome::Scheduled
    }

    /// Synchronous cancellation path.
    fn cancel_now(&mut self, id: CommandId) {
        if !self.live.contains(&id) {
            tracing::trace!(command = %id, "cancel ignored, command not running");
            return;
        }
        tracing::debug!(command = %id, "command cancelled");
        self.interrupt_command(id);
    }

    /// Forced exit: `end(true)` (best-effort if the command is faulting),
    /// interrupt observers, release live membership and every claim.
    fn interrupt_command(&mut self, id: CommandId) {
        let _ = self.invoke(id, "end", |command, scheduler| command.end(scheduler, true));
        self.notify(CommandEvent::Interrupted, id);
        self.release(id);
    }

    fn release(&mut self, id: CommandId) {
        self.live.retain(|&live_id| live_id != id);
        self.claims.retain(|_, owner| *owner != id);
    }

    /// Replay deferred requests: all pending cancels first, then pending
    /// schedules. A cancel enqueued by a flushed schedule is processed before
    /// the remaining schedules. Drains both queues to empty.
    fn flush_pending(&mut self) {
        loop {
            if let Some(id) = self.pending_cancel.pop_front() {
                self.in_tick = true;
                self.cancel_now(id);
                self.in_tick = false;
                continue;
            }
            if let Some(id) = self.pending_schedule.pop_front() {
                self.in_tick = true;
                let _ = self.schedule_now(id);
                self.in_tick = false;
                continue;
            }
            break;
        }
    }

    fn poll_bindings(&mut self) {
        let mut event_loop = std::mem::take(&mut self.event_loop);
        event_loop.poll(self);
        // An action may have registered new bindings through the scheduler
        // while the loop was checked out; keep them.
        let added = std::mem::replace(&mut self.event_loop, event_loop);
        self.event_loop.absorb(added);
    }

    /// Call a lifecycle callback with the command temporarily checked out of
    /// the arena. A panic inside the callback is caught at this boundary and
    /// reported; the command box always goes back.
    fn invoke(
        &mut self,
        id: CommandId,
        phase: &'static str,
        f: impl FnOnce(&mut dyn Command, &mut Scheduler),
    ) -> Invoke {
        let mut command = match self.commands.get_mut(&id).and_then(|slot| slot.take()) {
            Some(command) => command,
            None => return Invoke::Missing,
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| f(command.as_mut(), self)));
        if let Some(slot) = self.commands.get_mut(&id) {
            *slot = Some(command);
        }
        match outcome {
            Ok(()) => Invoke::Done,
            Err(payload) => {
                tracing::error!(
                    command = %id,
                    phase,
                    panic = panic_message(payload.as_ref()),
                    "command callback panicked"
                );
                Invoke::Faulted
            }
        }
    }

    fn check_finished(&mut self, id: CommandId) -> FinishCheck {
        let Some(command) = self.commands.get_mut(&id).and_then(|slot| slot.as_mut()) else {
            return FinishCheck::Missing;
        };
        match catch_unwind(AssertUnwindSafe(|| command.is_finished())) {
            Ok(true) => FinishCheck::Finished,
            Ok(false) => FinishCheck::Continuing,
            Err(payload) => {
                tracing::error!(
                    command = %id,
                    phase = "is_finished",
                    panic = panic_message(payload.as_ref()),
                    "command callback panicked"
                );
                FinishCheck::Faulted
            }
        }
    }

    fn notify(&mut self, event: CommandEvent, id: CommandId) {
        let Some(command) = self.commands.get(&id).and_then(|slot| slot.as_deref()) else {
            return;
        };
        self.observers.notify(event, id, command);
    }

    fn command_policy(&self, id: CommandId) -> Option<InterruptionPolicy> {
        self.commands
            .get(&id)
            .and_then(|slot| slot.as_deref())
            .map(|command| command.interruption_policy())
    }

    fn command_runs_while_disabled(&self, id: CommandId) -> Option<bool> {
        self.commands
            .get(&id)
            .and_then(|slot| slot.as_deref())
            .map(|command| command.runs_while_disabled())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
