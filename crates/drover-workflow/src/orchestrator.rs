//! Sequencing of the full shipment → trip → task lifecycle.
//!
//! One run drives one trip over one batch of shipments, threading the admin
//! session through creation and validation stages and a lazily created rider
//! session through trip and task execution. Every stage must validate before
//! the next request is issued.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use drover_client::{Actor, ApiTransport, AuthClient, Credentials, RouteTable, SessionManager};
use drover_contract::validate;
use drover_testdata::factory::{DEFAULT_RIDER_ID, DEFAULT_VEHICLE_ID};

use crate::error::WorkflowError;
use crate::retry::RetryPolicy;
use crate::shipments::ShipmentApi;
use crate::status::{
    assert_status, validate_completion_statuses, WorkflowStage, DISPLAY_DRIVER_ASSIGNED,
    DISPLAY_DELIVERY_COMPLETED, DISPLAY_IN_PROGRESS, DISPLAY_PENDING, STATUS_CODE_CREATED,
    STATUS_CODE_DELIVERED, STATUS_CODE_DRIVER_ASSIGNED,
};
use crate::tasks::{TaskApi, TaskKind};
use crate::trips::TripApi;

/// Knobs for one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub admin_credentials: Credentials,
    pub rider_credentials: Credentials,
    pub rider_id: i64,
    pub vehicle_id: i64,
    /// Retry budget for shipment fetches.
    pub fetch_retry: RetryPolicy,
    /// Retry budget for trip-info polling, which waits on server-side
    /// assignment and so gets a longer delay.
    pub trip_retry: RetryPolicy,
    pub min_shipments: usize,
}

impl WorkflowConfig {
    pub fn new(admin_credentials: Credentials, rider_credentials: Credentials) -> Self {
        Self {
            admin_credentials,
            rider_credentials,
            rider_id: DEFAULT_RIDER_ID,
            vehicle_id: DEFAULT_VEHICLE_ID,
            fetch_retry: RetryPolicy::new(3, Duration::from_secs(2)),
            trip_retry: RetryPolicy::new(3, Duration::from_secs(5)),
            min_shipments: 2,
        }
    }
}

/// What a completed run observed, for the test runner's assertions.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub shipment_ids: Vec<String>,
    pub trip_id: String,
    pub completed_tasks: usize,
}

pub struct Orchestrator {
    shipments: ShipmentApi,
    trips: TripApi,
    tasks: TaskApi,
    sessions: SessionManager,
    config: WorkflowConfig,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        routes: RouteTable,
        config: WorkflowConfig,
    ) -> Self {
        let auth = AuthClient::new(Arc::clone(&transport), routes.clone());
        Self {
            shipments: ShipmentApi::new(Arc::clone(&transport), routes.clone()),
            trips: TripApi::new(Arc::clone(&transport), routes.clone()),
            tasks: TaskApi::new(transport, routes),
            sessions: SessionManager::new(auth),
            config,
        }
    }

    /// Runs the whole workflow. Sessions are torn down best-effort whether
    /// the run passed or aborted.
    pub fn run(
        &mut self,
        shipment_payload: &Value,
        shipment_schema: &Value,
    ) -> Result<WorkflowReport, WorkflowError> {
        let outcome = self.run_stages(shipment_payload, shipment_schema);
        self.sessions.logout_all();
        outcome
    }

    fn run_stages(
        &mut self,
        shipment_payload: &Value,
        shipment_schema: &Value,
    ) -> Result<WorkflowReport, WorkflowError> {
        let admin_credentials = self.config.admin_credentials.clone();
        let admin_cookie = self
            .sessions
            .create_session(Actor::Admin, &admin_credentials)?
            .cookie
            .clone();

        // The payload must satisfy the request contract before it is sent.
        let report = validate(shipment_schema, shipment_payload);
        if !report.is_valid {
            return Err(WorkflowError::ContractViolation {
                summary: report.summary(),
            });
        }

        let shipment_ids = self.create_shipments(shipment_payload, &admin_cookie)?;
        let trip_id = self.create_trip(&shipment_ids, &admin_cookie)?;

        let mut rider_cookie: Option<String> = None;
        let mut completed_tasks = 0usize;
        for (position, shipment_id) in shipment_ids.iter().enumerate() {
            tracing::info!(
                shipment_id,
                position = position + 1,
                total = shipment_ids.len(),
                "processing shipment"
            );

            let task_ids =
                self.fetch_and_validate_trip_info(position, shipment_id, &trip_id, &admin_cookie)?;

            self.validate_tasks_pending(&task_ids, &admin_cookie)?;
            self.shipments.validate_status(
                self.config.fetch_retry,
                shipment_id,
                STATUS_CODE_DRIVER_ASSIGNED,
                DISPLAY_DRIVER_ASSIGNED,
                &admin_cookie,
            )?;

            if position == 0 {
                let cookie = self.authenticate_rider_and_start_trip(&trip_id)?;
                rider_cookie = Some(cookie);
                self.trips
                    .validate_status(&trip_id, &admin_cookie, WorkflowStage::Initial)?;
            }
            let rider = rider_cookie.as_deref().ok_or_else(|| {
                WorkflowError::stage("rider authentication", "no rider session available")
            })?;

            for (task_position, task_id) in task_ids.iter().enumerate() {
                self.tasks
                    .process_task(task_id, TaskKind::from_position(task_position), rider)?;
                completed_tasks += 1;
            }

            let stage = if position == shipment_ids.len() - 1 {
                WorkflowStage::Complete
            } else {
                WorkflowStage::Partial
            };
            self.trips.validate_status(&trip_id, &admin_cookie, stage)?;
            tracing::info!(shipment_id, "shipment workflow completed");
        }

        let rider = rider_cookie.ok_or_else(|| {
            WorkflowError::stage("trip completion", "no rider session available")
        })?;
        self.complete_trip_and_validate(&trip_id, &rider)?;

        for shipment_id in &shipment_ids {
            self.shipments.validate_status(
                self.config.fetch_retry,
                shipment_id,
                STATUS_CODE_DELIVERED,
                DISPLAY_DELIVERY_COMPLETED,
                &admin_cookie,
            )?;
        }

        tracing::info!(trip_id, completed_tasks, "workflow run completed");
        Ok(WorkflowReport {
            shipment_ids,
            trip_id,
            completed_tasks,
        })
    }

    fn create_shipments(
        &self,
        payload: &Value,
        admin_cookie: &str,
    ) -> Result<Vec<String>, WorkflowError> {
        let creation = self.shipments.create(payload, admin_cookie)?;
        if !creation.success {
            return Err(WorkflowError::stage(
                "shipment creation",
                format!(
                    "status {} with {}",
                    creation.status_code,
                    creation
                        .response
                        .get("failed_entries")
                        .map(|entries| entries.to_string())
                        .unwrap_or_else(|| "no failure detail".to_string())
                ),
            ));
        }
        if creation.awb_numbers.len() < self.config.min_shipments {
            return Err(WorkflowError::stage(
                "shipment creation",
                format!(
                    "expected at least {} shipments, got {}",
                    self.config.min_shipments,
                    creation.awb_numbers.len()
                ),
            ));
        }

        // Every created shipment must be fetchable with a status before the
        // workflow builds anything on top of it.
        for shipment_id in &creation.awb_numbers {
            let record = self
                .shipments
                .fetch_with_retry(self.config.fetch_retry, shipment_id, admin_cookie)
                .ok_or_else(|| {
                    WorkflowError::stage(
                        "shipment fetch",
                        format!("no data for shipment {shipment_id} after retries"),
                    )
                })?;
            if record.shipment_id != *shipment_id {
                return Err(WorkflowError::StatusMismatch {
                    entity: format!("shipment {shipment_id}"),
                    field: "shipment_id",
                    expected: shipment_id.clone(),
                    actual: record.shipment_id,
                });
            }
            if record.status_code.is_none() || record.display_name.is_none() {
                return Err(WorkflowError::MissingField {
                    context: "shipment fetch",
                    field: format!("status for shipment {shipment_id}"),
                });
            }
        }

        tracing::info!(shipments = creation.awb_numbers.len(), "shipments created and fetched");
        Ok(creation.awb_numbers)
    }

    fn create_trip(
        &self,
        shipment_ids: &[String],
        admin_cookie: &str,
    ) -> Result<String, WorkflowError> {
        let creation = self.trips.create(
            shipment_ids,
            self.config.rider_id,
            self.config.vehicle_id,
            admin_cookie,
        )?;
        if !creation.success {
            return Err(WorkflowError::stage(
                "trip creation",
                format!("status {}", creation.status_code),
            ));
        }
        creation.trip_id.ok_or(WorkflowError::MissingField {
            context: "trip creation",
            field: "trip_id".to_string(),
        })
    }

    fn fetch_and_validate_trip_info(
        &self,
        position: usize,
        shipment_id: &str,
        trip_id: &str,
        admin_cookie: &str,
    ) -> Result<Vec<String>, WorkflowError> {
        let info = self
            .trips
            .info_with_retry(self.config.trip_retry, shipment_id, admin_cookie)
            .ok_or_else(|| {
                WorkflowError::stage(
                    "trip info",
                    format!("no trip info for shipment {shipment_id} after retries"),
                )
            })?;

        // The first shipment sees the freshly assigned trip; later shipments
        // see it already underway.
        let expected_display = if position == 0 {
            DISPLAY_DRIVER_ASSIGNED
        } else {
            DISPLAY_IN_PROGRESS
        };
        let actual = info.status.unwrap_or_default();
        if actual != expected_display {
            return Err(WorkflowError::StatusMismatch {
                entity: format!("trip {trip_id}"),
                field: "display_name",
                expected: expected_display.to_string(),
                actual,
            });
        }

        if info.task_ids.len() < 2 {
            return Err(WorkflowError::stage(
                "trip info",
                format!(
                    "expected at least 2 tasks for shipment {shipment_id}, got {}",
                    info.task_ids.len()
                ),
            ));
        }
        Ok(info.task_ids)
    }

    fn validate_tasks_pending(
        &self,
        task_ids: &[String],
        admin_cookie: &str,
    ) -> Result<(), WorkflowError> {
        for task_id in task_ids {
            let details = self.tasks.details(task_id, admin_cookie)?;
            if !details.success {
                return Err(WorkflowError::stage(
                    "task details",
                    format!("failed to get task details for task {task_id}"),
                ));
            }
            let status = details.status.ok_or_else(|| WorkflowError::MissingField {
                context: "task details",
                field: format!("status for task {task_id}"),
            })?;
            assert_status(
                &format!("task {task_id}"),
                &status,
                STATUS_CODE_CREATED,
                DISPLAY_PENDING,
            )?;
        }
        Ok(())
    }

    fn authenticate_rider_and_start_trip(
        &mut self,
        trip_id: &str,
    ) -> Result<String, WorkflowError> {
        tracing::info!("authenticating as rider");
        let rider_credentials = self.config.rider_credentials.clone();
        let rider_cookie = self
            .sessions
            .create_session(Actor::Rider, &rider_credentials)?
            .cookie
            .clone();

        tracing::info!(trip_id, "starting trip");
        let outcome = self.trips.update_status(trip_id, "start", &rider_cookie)?;
        if !outcome.success {
            return Err(WorkflowError::stage(
                "trip start",
                format!("failed to start trip {trip_id}"),
            ));
        }
        Ok(rider_cookie)
    }

    fn complete_trip_and_validate(
        &self,
        trip_id: &str,
        rider_cookie: &str,
    ) -> Result<(), WorkflowError> {
        tracing::info!(trip_id, "completing trip");
        let outcome = self.trips.update_status(trip_id, "complete", rider_cookie)?;
        if !outcome.success {
            return Err(WorkflowError::stage(
                "trip completion",
                format!("failed to complete trip {trip_id}"),
            ));
        }
        validate_completion_statuses(&outcome.body)
    }
}
