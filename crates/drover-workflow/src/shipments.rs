//! Shipment operations and status checks.

use std::sync::Arc;

use serde_json::Value;

use drover_client::{ApiCall, ApiTransport, CallOutcome, RouteTable, TransportError};
use drover_core::get_path_string;

use crate::error::WorkflowError;
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::status::{assert_status, EntityStatus};

/// Outcome of the shipment-creation stage.
#[derive(Debug, Clone)]
pub struct ShipmentCreation {
    pub success: bool,
    pub status_code: u16,
    pub response: Value,
    pub awb_numbers: Vec<String>,
}

/// One fetched shipment, reduced to the fields the workflow asserts on.
#[derive(Debug, Clone)]
pub struct ShipmentRecord {
    pub shipment_id: String,
    pub status_code: Option<String>,
    pub display_name: Option<String>,
    pub raw: Value,
}

pub struct ShipmentApi {
    transport: Arc<dyn ApiTransport>,
    routes: RouteTable,
}

impl ShipmentApi {
    pub fn new(transport: Arc<dyn ApiTransport>, routes: RouteTable) -> Self {
        Self { transport, routes }
    }

    /// Submits the creation payload and extracts the AWB numbers of every
    /// created shipment.
    pub fn create(&self, payload: &Value, cookie: &str) -> Result<ShipmentCreation, WorkflowError> {
        let outcome = self
            .transport
            .execute(ApiCall::post(&self.routes.create_shipment, payload.clone()).with_cookie(cookie))
            .map_err(|source| WorkflowError::transport("shipment creation", source))?;

        let awb_numbers = extract_awb_numbers(&outcome.body);
        tracing::info!(
            success = outcome.success,
            shipments = awb_numbers.len(),
            "shipment creation finished"
        );
        Ok(ShipmentCreation {
            success: outcome.success,
            status_code: outcome.status_code,
            response: outcome.body,
            awb_numbers,
        })
    }

    pub fn fetch(&self, awb_number: &str, cookie: &str) -> Result<CallOutcome, TransportError> {
        let endpoint = format!("{}/{awb_number}", self.routes.fetch_shipment);
        self.transport
            .execute(ApiCall::get(endpoint).with_cookie(cookie))
    }

    /// Fetches one shipment under the retry budget, returning `None` once
    /// every attempt is exhausted or the record lacks an identifier.
    pub fn fetch_with_retry(
        &self,
        policy: RetryPolicy,
        awb_number: &str,
        cookie: &str,
    ) -> Option<ShipmentRecord> {
        execute_with_retry(
            &format!("fetch_shipment_{awb_number}"),
            policy,
            || self.fetch(awb_number, cookie),
            |outcome| outcome.status_code == 200 && outcome.success,
            |outcome| extract_shipment_record(&outcome.body),
            || None,
        )
    }

    /// Fetches the shipment and asserts identifier match, status presence,
    /// and the expected status pair.
    pub fn validate_status(
        &self,
        policy: RetryPolicy,
        shipment_id: &str,
        expected_code: &str,
        expected_display: &str,
        cookie: &str,
    ) -> Result<(), WorkflowError> {
        let record = self
            .fetch_with_retry(policy, shipment_id, cookie)
            .ok_or_else(|| {
                WorkflowError::stage(
                    "shipment fetch",
                    format!("no data for shipment {shipment_id} after retries"),
                )
            })?;

        if record.shipment_id != shipment_id {
            return Err(WorkflowError::StatusMismatch {
                entity: format!("shipment {shipment_id}"),
                field: "shipment_id",
                expected: shipment_id.to_string(),
                actual: record.shipment_id,
            });
        }

        let status = record_status(&record, shipment_id)?;
        assert_status(
            &format!("shipment {shipment_id}"),
            &status,
            expected_code,
            expected_display,
        )?;
        tracing::info!(
            shipment_id,
            status = expected_code,
            display = expected_display,
            "shipment status validated"
        );
        Ok(())
    }
}

fn record_status(
    record: &ShipmentRecord,
    shipment_id: &str,
) -> Result<EntityStatus, WorkflowError> {
    let status_code = record
        .status_code
        .clone()
        .ok_or_else(|| WorkflowError::MissingField {
            context: "shipment fetch",
            field: format!("status_code for shipment {shipment_id}"),
        })?;
    let display_name = record
        .display_name
        .clone()
        .ok_or_else(|| WorkflowError::MissingField {
            context: "shipment fetch",
            field: format!("display_name for shipment {shipment_id}"),
        })?;
    Ok(EntityStatus {
        status_code,
        display_name,
    })
}

fn extract_awb_numbers(body: &Value) -> Vec<String> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| get_path_string(entry, "awb_number"))
                .collect()
        })
        .unwrap_or_default()
}

fn extract_shipment_record(body: &Value) -> Option<ShipmentRecord> {
    let data = body.get("data")?;
    let shipment_id = get_path_string(data, "awb_number")
        .or_else(|| get_path_string(data, "id"))
        .or_else(|| get_path_string(data, "shipment_id"))?;

    Some(ShipmentRecord {
        status_code: get_path_string(data, "status.status_code"),
        display_name: get_path_string(data, "status.display_name"),
        shipment_id,
        raw: data.clone(),
    })
}
