//! Engine error taxonomy. Configuration errors are fatal to a run and
//! raised before any simulation work happens; an empty tier is signaled
//! per tier and does not abort reporting on the others.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("capacity schedule is empty")]
    EmptySchedule,

    #[error("capacity schedule entry {index} must be positive")]
    InvalidCapacity { index: usize },

    #[error("bias must be at least 1.0, got {0}")]
    InvalidBias(f64),

    #[error("attrition probability must be within [0, 1], got {0}")]
    InvalidAttrition(f64),

    #[error("level {0} does not exist in this hierarchy")]
    UnknownLevel(usize),

    #[error("level {0} has no members to report on")]
    EmptyTier(usize),
}
