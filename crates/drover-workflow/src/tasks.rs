//! Task execution: status events, proof-of-work, and OTP confirmation.

use std::sync::Arc;

use serde_json::Value;

use drover_client::{ApiCall, ApiTransport, RouteTable};
use drover_core::get_path_string;
use drover_testdata::factory;

use crate::error::WorkflowError;
use crate::status::EntityStatus;

/// Proof-of-work events every task submits, in order, between `start` and
/// `complete`.
pub const PROOF_OF_WORK_EVENTS: [&str; 3] = [
    "complete_image_proof",
    "complete_notes_proof",
    "complete_signature_proof",
];

const OTP_PATH: &str = "data.0.proofs_of_work.otp.0.meta.otp";

/// Task role within its shipment pair, derived from list position: even
/// indices pick up, odd indices drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Pickup,
    Drop,
}

impl TaskKind {
    pub fn from_position(position: usize) -> Self {
        if position % 2 == 0 {
            Self::Pickup
        } else {
            Self::Drop
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Drop => "drop",
        }
    }
}

/// Outcome of a task-detail fetch.
#[derive(Debug, Clone)]
pub struct TaskDetails {
    pub success: bool,
    pub status_code: u16,
    pub response: Value,
    pub status: Option<EntityStatus>,
}

pub struct TaskApi {
    transport: Arc<dyn ApiTransport>,
    routes: RouteTable,
}

impl TaskApi {
    pub fn new(transport: Arc<dyn ApiTransport>, routes: RouteTable) -> Self {
        Self { transport, routes }
    }

    pub fn details(&self, task_id: &str, cookie: &str) -> Result<TaskDetails, WorkflowError> {
        let outcome = self
            .transport
            .execute(
                ApiCall::get(&self.routes.task_details)
                    .with_query("task_id", task_id)
                    .with_cookie(cookie),
            )
            .map_err(|source| WorkflowError::transport("task details fetch", source))?;

        let status = if outcome.success {
            extract_task_status(&outcome.body)
        } else {
            None
        };
        tracing::info!(task_id, success = outcome.success, ?status, "task details fetched");
        Ok(TaskDetails {
            success: outcome.success,
            status_code: outcome.status_code,
            response: outcome.body,
            status,
        })
    }

    /// Reads the drop-task OTP from a fresh detail fetch. Fails closed: no
    /// OTP in the proof data means the task cannot proceed.
    pub fn extract_otp(&self, task_id: &str, cookie: &str) -> Result<String, WorkflowError> {
        let details = self.details(task_id, cookie)?;
        if !details.success {
            return Err(WorkflowError::MissingOtp {
                task_id: task_id.to_string(),
            });
        }
        let otp = get_path_string(&details.response, OTP_PATH).ok_or_else(|| {
            WorkflowError::MissingOtp {
                task_id: task_id.to_string(),
            }
        })?;
        tracing::info!(task_id, "extracted OTP for drop task");
        Ok(otp)
    }

    fn update_status(
        &self,
        task_id: &str,
        event: &str,
        cookie: &str,
    ) -> Result<(), WorkflowError> {
        let payload = factory::task_status_payload(task_id, event)?;
        let outcome = self
            .transport
            .execute(ApiCall::put(&self.routes.task_status_update, payload).with_cookie(cookie))
            .map_err(|source| WorkflowError::transport("task status update", source))?;
        if !outcome.success {
            return Err(WorkflowError::stage(
                "task workflow",
                format!("failed to update task {task_id} with event '{event}'"),
            ));
        }
        tracing::info!(task_id, event, "task event accepted");
        Ok(())
    }

    fn submit_otp(&self, task_id: &str, otp: &str, cookie: &str) -> Result<(), WorkflowError> {
        let endpoint = format!("{}/{task_id}/proof_of_work/otp", self.routes.task_otp);
        let outcome = self
            .transport
            .execute(ApiCall::post(endpoint, factory::task_otp_payload(otp)).with_cookie(cookie))
            .map_err(|source| WorkflowError::transport("task OTP submission", source))?;
        if !outcome.success {
            return Err(WorkflowError::stage(
                "task workflow",
                format!("failed to submit OTP for task {task_id}"),
            ));
        }
        tracing::info!(task_id, "OTP submitted");
        Ok(())
    }

    /// Runs the fixed per-task sequence: start, the three proof-of-work
    /// events, OTP confirmation for drop tasks, then complete. The first
    /// failing step aborts the task.
    pub fn process_task(
        &self,
        task_id: &str,
        kind: TaskKind,
        rider_cookie: &str,
    ) -> Result<(), WorkflowError> {
        tracing::info!(task_id, kind = kind.as_str(), "processing task workflow");

        self.update_status(task_id, "start", rider_cookie)?;
        for event in PROOF_OF_WORK_EVENTS {
            self.update_status(task_id, event, rider_cookie)?;
        }

        if kind == TaskKind::Drop {
            let otp = self.extract_otp(task_id, rider_cookie)?;
            self.submit_otp(task_id, &otp, rider_cookie)?;
        }

        self.update_status(task_id, "complete", rider_cookie)?;
        tracing::info!(task_id, kind = kind.as_str(), "task completed");
        Ok(())
    }
}

fn extract_task_status(body: &Value) -> Option<EntityStatus> {
    Some(EntityStatus {
        status_code: get_path_string(body, "data.0.status.status_code")?,
        display_name: get_path_string(body, "data.0.status.display_name")?,
    })
}
