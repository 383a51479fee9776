//! commandeer - a cooperative command scheduler for periodic robot-control loops
//!
//! commandeer admits short-lived or long-running units of behavior
//! ("commands"), arbitrates their exclusive claims on shared physical
//! resources ("subsystems"), and drives their lifecycle once per control-loop
//! period. It is single-threaded and cooperative: no time-slicing, no
//! internal threads, no preemption beyond the claim-arbitration rules.

pub mod command;
pub mod error;
pub mod id;
pub mod scheduler;
pub mod subsystem;

pub use command::{Command, FunctionalCommand, InterruptionPolicy};
pub use error::{Result, SchedulerError};
pub use id::{CommandId, SubsystemId};
pub use scheduler::{EventLoop, ScheduleOutcome, Scheduler};
pub use subsystem::Subsystem;
