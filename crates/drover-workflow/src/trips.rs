//! Trip operations: creation, per-shipment info, status changes, and
//! stage-aware status validation.

use std::sync::Arc;

use serde_json::Value;

use drover_client::{ApiCall, ApiTransport, CallOutcome, RouteTable, TransportError};
use drover_core::{get_path, get_path_string};
use drover_testdata::factory;

use crate::error::WorkflowError;
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::status::{organize_into_pairs, validate_stage, StageSummary, TaskSnapshot, WorkflowStage};

/// Outcome of the trip-creation stage.
#[derive(Debug, Clone)]
pub struct TripCreation {
    pub success: bool,
    pub status_code: u16,
    pub response: Value,
    pub trip_id: Option<String>,
}

/// Trip info for one shipment: the trip it rides on, its task ids, and the
/// trip's display status.
#[derive(Debug, Clone)]
pub struct TripInfo {
    pub status_code: u16,
    pub response: Value,
    pub trip_id: Option<String>,
    pub task_ids: Vec<String>,
    pub status: Option<String>,
}

impl TripInfo {
    /// The retry predicate: info is only useful once the server reports the
    /// trip id, a status, and at least one task.
    fn is_complete(&self) -> bool {
        self.trip_id.is_some() && self.status.is_some() && !self.task_ids.is_empty()
    }
}

pub struct TripApi {
    transport: Arc<dyn ApiTransport>,
    routes: RouteTable,
}

impl TripApi {
    pub fn new(transport: Arc<dyn ApiTransport>, routes: RouteTable) -> Self {
        Self { transport, routes }
    }

    /// Creates a trip covering `shipment_ids`, pairing a pickup and a drop
    /// task per shipment.
    pub fn create(
        &self,
        shipment_ids: &[String],
        rider_id: i64,
        vehicle_id: i64,
        cookie: &str,
    ) -> Result<TripCreation, WorkflowError> {
        tracing::info!(?shipment_ids, "creating trip");
        let payload = factory::trip_creation_payload(shipment_ids, rider_id, vehicle_id)?;
        let outcome = self
            .transport
            .execute(ApiCall::post(&self.routes.create_trip, payload).with_cookie(cookie))
            .map_err(|source| WorkflowError::transport("trip creation", source))?;

        let trip_id = get_path_string(&outcome.body, "data.0.trip_id");
        tracing::info!(success = outcome.success, ?trip_id, "trip creation finished");
        Ok(TripCreation {
            success: outcome.success,
            status_code: outcome.status_code,
            response: outcome.body,
            trip_id,
        })
    }

    fn fetch_info(&self, shipment_id: &str, cookie: &str) -> Result<CallOutcome, TransportError> {
        let endpoint = format!("{}/{shipment_id}/trip-info", self.routes.trip_info);
        self.transport
            .execute(ApiCall::get(endpoint).with_cookie(cookie))
    }

    /// Polls trip info for `shipment_id` until the server has assigned the
    /// shipment to a trip with tasks, or the retry budget runs out.
    pub fn info_with_retry(
        &self,
        policy: RetryPolicy,
        shipment_id: &str,
        cookie: &str,
    ) -> Option<TripInfo> {
        execute_with_retry(
            &format!("get_trip_info_{shipment_id}"),
            policy,
            || self.fetch_info(shipment_id, cookie),
            |outcome| outcome.success && extract_trip_info(outcome).is_complete(),
            |outcome| Some(extract_trip_info(&outcome)),
            || None,
        )
    }

    /// Pushes a trip lifecycle event (`start`, `complete`).
    pub fn update_status(
        &self,
        trip_id: &str,
        event: &str,
        cookie: &str,
    ) -> Result<CallOutcome, WorkflowError> {
        tracing::info!(trip_id, event, "updating trip status");
        let payload = factory::trip_status_payload(trip_id, event)?;
        self.transport
            .execute(ApiCall::put(&self.routes.trip_status_update, payload).with_cookie(cookie))
            .map_err(|source| WorkflowError::transport("trip status update", source))
    }

    pub fn fetch_status(&self, trip_id: &str, cookie: &str) -> Result<CallOutcome, WorkflowError> {
        let endpoint = format!("{}/{trip_id}", self.routes.trip_status_fetch);
        self.transport
            .execute(ApiCall::get(endpoint).with_cookie(cookie))
            .map_err(|source| WorkflowError::transport("trip status fetch", source))
    }

    /// Fetches the trip's task list and validates every pickup/drop pair
    /// against the expectations of `stage`.
    pub fn validate_status(
        &self,
        trip_id: &str,
        cookie: &str,
        stage: WorkflowStage,
    ) -> Result<StageSummary, WorkflowError> {
        tracing::info!(trip_id, stage = stage.as_str(), "validating trip status");
        let outcome = self.fetch_status(trip_id, cookie)?;
        if !outcome.success {
            return Err(WorkflowError::stage(
                "trip status fetch",
                format!("failed to fetch trip status for trip {trip_id}"),
            ));
        }

        let tasks_value = get_path(&outcome.body, "data.tasks")
            .cloned()
            .ok_or_else(|| WorkflowError::MissingField {
                context: "trip status",
                field: "data.tasks".to_string(),
            })?;
        let tasks: Vec<TaskSnapshot> = serde_json::from_value(tasks_value).map_err(|error| {
            WorkflowError::stage("trip status fetch", format!("malformed task list: {error}"))
        })?;
        if tasks.is_empty() {
            return Err(WorkflowError::MissingField {
                context: "trip status",
                field: "data.tasks".to_string(),
            });
        }

        let current_task = get_path_string(&outcome.body, "data.current_task").unwrap_or_default();
        let total_tasks = get_path_string(&outcome.body, "data.total_tasks")
            .unwrap_or_else(|| tasks.len().to_string());
        tracing::info!(trip_id, current_task, total_tasks, "trip progress");

        let pairs = organize_into_pairs(&tasks)?;
        let summary = validate_stage(&pairs, stage)?;
        tracing::info!(
            trip_id,
            stage = stage.as_str(),
            completed = summary.completed_shipments,
            pending = summary.pending_shipments,
            "trip status validation passed"
        );
        Ok(summary)
    }
}

fn extract_trip_info(outcome: &CallOutcome) -> TripInfo {
    let body = &outcome.body;
    let task_ids = get_path(body, "data.tasks")
        .and_then(Value::as_array)
        .map(|tasks| {
            tasks
                .iter()
                .filter_map(|task| get_path_string(task, "id"))
                .collect()
        })
        .unwrap_or_default();

    TripInfo {
        status_code: outcome.status_code,
        trip_id: get_path_string(body, "data.trip_id"),
        status: get_path_string(body, "data.status.display_name")
            .or_else(|| get_path_string(body, "data.status")),
        task_ids,
        response: body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use drover_client::CallOutcome;

    use super::extract_trip_info;

    fn outcome(body: serde_json::Value) -> CallOutcome {
        CallOutcome {
            status_code: 200,
            body,
            success: true,
            set_cookies: Vec::new(),
        }
    }

    #[test]
    fn trip_info_extraction_reads_ids_status_and_tasks() {
        let info = extract_trip_info(&outcome(json!({
            "success": true,
            "data": {
                "trip_id": 7001,
                "status": {"display_name": "Driver Assigned"},
                "tasks": [{"id": 1}, {"id": "2"}]
            }
        })));
        assert_eq!(info.trip_id.as_deref(), Some("7001"));
        assert_eq!(info.status.as_deref(), Some("Driver Assigned"));
        assert_eq!(info.task_ids, vec!["1".to_string(), "2".to_string()]);
        assert!(info.is_complete());
    }

    #[test]
    fn trip_info_accepts_plain_string_status() {
        let info = extract_trip_info(&outcome(json!({
            "data": {"trip_id": 7001, "status": "In Progress", "tasks": [{"id": 9}]}
        })));
        assert_eq!(info.status.as_deref(), Some("In Progress"));
    }

    #[test]
    fn incomplete_trip_info_is_flagged_for_retry() {
        let info = extract_trip_info(&outcome(json!({"data": {"tasks": []}})));
        assert!(info.trip_id.is_none());
        assert!(info.task_ids.is_empty());
        assert!(!info.is_complete());
    }
}
