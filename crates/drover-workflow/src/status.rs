//! Stage-aware validation of task, trip, and shipment statuses.

use serde::Deserialize;
use serde_json::Value;

use drover_core::get_path_string;

use crate::error::WorkflowError;

pub const STATUS_CODE_CREATED: &str = "CR";
pub const STATUS_CODE_DRIVER_ASSIGNED: &str = "RA";
pub const STATUS_CODE_COMPLETED: &str = "C";
pub const STATUS_CODE_DELIVERED: &str = "DL";

pub const DISPLAY_PENDING: &str = "Pending";
pub const DISPLAY_DRIVER_ASSIGNED: &str = "Driver Assigned";
pub const DISPLAY_IN_PROGRESS: &str = "In Progress";
pub const DISPLAY_COMPLETED: &str = "Completed";
pub const DISPLAY_DELIVERY_COMPLETED: &str = "Delivery Completed";

pub const TRIP_STATUS_COMPLETED: &str = "C";
pub const VEHICLE_STATUS_IDLE: &str = "idle";
pub const RIDER_STATUS_IDLE: &str = "idle";

/// A server-reported status pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntityStatus {
    pub status_code: String,
    pub display_name: String,
}

/// Named points in the trip lifecycle with distinct expected status
/// combinations across all task pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Initial,
    Partial,
    Complete,
}

impl WorkflowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Partial => "partial",
            Self::Complete => "complete",
        }
    }
}

/// A task as it appears in the trip-status response.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub task_number: Value,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub status: Option<EntityStatus>,
}

impl TaskSnapshot {
    pub fn id_text(&self) -> String {
        match &self.id {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            _ => "Unknown ID".to_string(),
        }
    }
}

/// A pickup/drop pair belonging to one shipment, numbered from 1 in creation
/// order.
#[derive(Debug, Clone)]
pub struct ShipmentPair {
    pub shipment_number: usize,
    pub pickup: TaskSnapshot,
    pub drop: TaskSnapshot,
}

/// How the pairs split across buckets during stage validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub completed_shipments: usize,
    pub pending_shipments: usize,
}

/// Asserts exact equality of both status fields, naming the entity and the
/// mismatched field on failure.
pub fn assert_status(
    entity: &str,
    actual: &EntityStatus,
    expected_code: &str,
    expected_display: &str,
) -> Result<(), WorkflowError> {
    if actual.status_code != expected_code {
        return Err(WorkflowError::StatusMismatch {
            entity: entity.to_string(),
            field: "status_code",
            expected: expected_code.to_string(),
            actual: actual.status_code.clone(),
        });
    }
    if actual.display_name != expected_display {
        return Err(WorkflowError::StatusMismatch {
            entity: entity.to_string(),
            field: "display_name",
            expected: expected_display.to_string(),
            actual: actual.display_name.clone(),
        });
    }
    Ok(())
}

/// Partitions `tasks` by type and zips them positionally into shipment pairs.
/// Unequal pickup/drop counts are fatal; nothing downstream is meaningful
/// without the pairing.
pub fn organize_into_pairs(tasks: &[TaskSnapshot]) -> Result<Vec<ShipmentPair>, WorkflowError> {
    let mut pickups = Vec::new();
    let mut drops = Vec::new();
    for task in tasks {
        match task.task_type.to_lowercase().as_str() {
            "pickup" => pickups.push(task.clone()),
            "drop" => drops.push(task.clone()),
            _ => {}
        }
    }

    if pickups.len() != drops.len() {
        return Err(WorkflowError::PairCountMismatch {
            pickups: pickups.len(),
            drops: drops.len(),
        });
    }

    let pairs: Vec<ShipmentPair> = pickups
        .into_iter()
        .zip(drops)
        .enumerate()
        .map(|(position, (pickup, drop))| ShipmentPair {
            shipment_number: position + 1,
            pickup,
            drop,
        })
        .collect();
    tracing::info!(pairs = pairs.len(), "organized tasks into shipment pairs");
    Ok(pairs)
}

/// Validates every pair against the expectations of `stage` and reports how
/// the pairs split across completed/pending.
pub fn validate_stage(
    pairs: &[ShipmentPair],
    stage: WorkflowStage,
) -> Result<StageSummary, WorkflowError> {
    if pairs.is_empty() {
        tracing::warn!(stage = stage.as_str(), "no shipment pairs to validate");
        return Ok(StageSummary {
            completed_shipments: 0,
            pending_shipments: 0,
        });
    }

    let mut completed = 0usize;
    let mut pending = 0usize;
    for pair in pairs {
        let (expected_code, expected_display) = match stage {
            WorkflowStage::Initial => (STATUS_CODE_CREATED, DISPLAY_PENDING),
            WorkflowStage::Complete => (STATUS_CODE_COMPLETED, DISPLAY_COMPLETED),
            // The first shipment's pair is the one a partial run completed.
            WorkflowStage::Partial if pair.shipment_number == 1 => {
                (STATUS_CODE_COMPLETED, DISPLAY_COMPLETED)
            }
            WorkflowStage::Partial => (STATUS_CODE_CREATED, DISPLAY_PENDING),
        };

        validate_pair_task(&pair.pickup, "pickup", expected_code, expected_display)?;
        validate_pair_task(&pair.drop, "drop", expected_code, expected_display)?;

        if expected_code == STATUS_CODE_COMPLETED {
            completed += 1;
        } else {
            pending += 1;
        }
        tracing::info!(
            shipment = pair.shipment_number,
            expected = expected_display,
            "shipment pair validated"
        );
    }

    // A partial stage that completed none or all of the pairs means the
    // workflow never actually reached a mixed state.
    if stage == WorkflowStage::Partial && (completed == 0 || pending == 0) {
        return Err(WorkflowError::PartialStageUniform { completed, pending });
    }

    tracing::info!(
        stage = stage.as_str(),
        completed,
        pending,
        "stage validation passed"
    );
    Ok(StageSummary {
        completed_shipments: completed,
        pending_shipments: pending,
    })
}

fn validate_pair_task(
    task: &TaskSnapshot,
    role: &str,
    expected_code: &str,
    expected_display: &str,
) -> Result<(), WorkflowError> {
    let entity = format!("{role} task {}", task.id_text());
    let status = task
        .status
        .as_ref()
        .ok_or_else(|| WorkflowError::MissingField {
            context: "trip status",
            field: format!("{entity} status"),
        })?;
    assert_status(&entity, status, expected_code, expected_display)
}

/// Validates the trip-completion response: trip, vehicle, and rider statuses
/// are each asserted independently.
pub fn validate_completion_statuses(body: &Value) -> Result<(), WorkflowError> {
    let checks: [(&str, &str, &str); 3] = [
        ("trip", "data.0.updated_status.trip", TRIP_STATUS_COMPLETED),
        ("vehicle", "data.0.updated_status.vehicle", VEHICLE_STATUS_IDLE),
        ("rider", "data.0.updated_status.rider", RIDER_STATUS_IDLE),
    ];

    for (entity, path, expected) in checks {
        let actual =
            get_path_string(body, path).ok_or_else(|| WorkflowError::MissingField {
                context: "trip completion",
                field: path.to_string(),
            })?;
        if actual != expected {
            return Err(WorkflowError::StatusMismatch {
                entity: entity.to_string(),
                field: "status",
                expected: expected.to_string(),
                actual,
            });
        }
        tracing::info!(entity, status = expected, "completion status validated");
    }
    Ok(())
}
