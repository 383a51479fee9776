//! Error types for commandeer
//!
//! Centralized error handling using thiserror. Scheduling conflicts are
//! deliberately not represented here: a blocked schedule attempt is a normal
//! outcome (see [`ScheduleOutcome`](crate::scheduler::ScheduleOutcome)), not
//! an error.

use thiserror::Error;

use crate::id::{CommandId, SubsystemId};

/// All error types that can occur in commandeer
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A default command must require exactly its own subsystem
    #[error("default command {command} for subsystem {subsystem} must require exactly that subsystem")]
    DefaultCommandRequirements {
        subsystem: SubsystemId,
        command: CommandId,
    },

    /// Command id was never registered with this scheduler
    #[error("unknown command: {0}")]
    UnknownCommand(CommandId),

    /// Subsystem id was never registered with this scheduler
    #[error("unknown subsystem: {0}")]
    UnknownSubsystem(SubsystemId),

    /// run() was called from inside a command callback or another run()
    #[error("run() called reentrantly from inside a tick")]
    ReentrantRun,
}

/// Result type alias for commandeer operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
