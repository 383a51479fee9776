//! Scheduler module: lifecycle driving, resource arbitration, and triggers.
//!
//! This module provides:
//! - **Scheduler**: the owned core that admits commands, arbitrates exclusive
//!   subsystem claims, and drives command lifecycles once per tick.
//! - **ScheduleOutcome**: what happened to a schedule request.
//! - **EventLoop**: rising-edge trigger bindings polled at the start of every
//!   tick.
//! - Lifecycle observers registered through the `on_command_*` methods.
//!
//! # Architecture
//!
//! The scheduler is single-threaded and cooperative. One external driver
//! calls [`Scheduler::run`] once per control-loop period (typically 20 ms):
//! 1. Trigger bindings are polled; their actions schedule and cancel
//!    synchronously.
//! 2. If disabled, live commands that do not run while disabled are swept.
//! 3. Unclaimed subsystems admit their default commands.
//! 4. Every live command executes; finished ones are reaped.
//! 5. Subsystem periodic hooks run.
//! 6. Requests deferred by reentrant callbacks are flushed: cancels first,
//!    then schedules.
//!
//! # Example
//!
//! ```ignore
//! use commandeer::{FunctionalCommand, Scheduler};
//!
//! let mut scheduler = Scheduler::new();
//! let wave = scheduler.register_command(Box::new(FunctionalCommand::instant(
//!     "wave",
//!     vec![],
//!     |_| println!("hello"),
//! )));
//! scheduler.schedule(wave);
//! scheduler.run()?;
//! ```

mod binding;
mod core;
mod events;

pub use self::binding::EventLoop;
pub use self::core::{ScheduleOutcome, Scheduler};
pub use self::events::CommandObserver;
