//! Fatal workflow failures.
//!
//! Everything here aborts the current run: status mismatches, broken
//! invariants, and stages whose retries were exhausted. Transient conditions
//! never become a `WorkflowError` directly; they are absorbed by the retry
//! executor and only surface once a stage gives up.

use thiserror::Error;

use drover_client::{SessionError, TransportError};
use drover_testdata::DataError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("transport failure during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("{stage} failed: {detail}")]
    StageFailed { stage: &'static str, detail: String },
    #[error("payload failed contract validation: {summary}")]
    ContractViolation { summary: String },
    #[error("expected {field} '{expected}' for {entity}, got '{actual}'")]
    StatusMismatch {
        entity: String,
        field: &'static str,
        expected: String,
        actual: String,
    },
    #[error("expected equal pickup and drop tasks, got {pickups} pickup and {drops} drop")]
    PairCountMismatch { pickups: usize, drops: usize },
    #[error("missing field '{field}' in {context} response")]
    MissingField {
        context: &'static str,
        field: String,
    },
    #[error("no OTP present in task detail for task {task_id}")]
    MissingOtp { task_id: String },
    #[error(
        "partial stage expected a mixed outcome, got {completed} completed and {pending} pending pairs"
    )]
    PartialStageUniform { completed: usize, pending: usize },
}

impl WorkflowError {
    pub fn stage(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::StageFailed {
            stage,
            detail: detail.into(),
        }
    }

    pub fn transport(operation: &'static str, source: TransportError) -> Self {
        Self::Transport { operation, source }
    }
}
