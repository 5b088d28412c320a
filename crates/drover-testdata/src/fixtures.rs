//! Base payloads and parametrized case tables, loaded from a data directory.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::invalid::ValidationCategory;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("'{value}' is not a numeric identifier")]
    BadIdentifier { value: String },
}

/// One row of a parametrized negative-validation table.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationCase {
    pub validation_type: ValidationCategory,
    pub field_path: String,
    #[serde(default)]
    pub invalid_value: Value,
    #[serde(default)]
    pub expected_error: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub test_category: String,
}

/// Loads test-data documents by file name from one directory.
#[derive(Debug, Clone)]
pub struct DataLibrary {
    data_dir: PathBuf,
}

impl DataLibrary {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn load_payload(&self, file_name: &str) -> Result<Value, DataError> {
        let path = self.data_dir.join(file_name);
        let raw = std::fs::read_to_string(&path).map_err(|source| DataError::Read {
            path: path.clone(),
            source,
        })?;
        let payload = serde_json::from_str(&raw).map_err(|source| DataError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(file = file_name, "payload loaded");
        Ok(payload)
    }

    /// Loads a validation-case table: a JSON array of case rows.
    pub fn load_cases(&self, file_name: &str) -> Result<Vec<ValidationCase>, DataError> {
        let document = self.load_payload(file_name)?;
        let path = self.data_dir.join(file_name);
        serde_json::from_value(document).map_err(|source| DataError::Parse { path, source })
    }

    /// Loads a shipment base payload and fills the enhancement defaults.
    pub fn shipment_payload(&self, file_name: &str) -> Result<Value, DataError> {
        Ok(enhance_shipment_payload(&self.load_payload(file_name)?))
    }
}

/// Fills the defaults a submittable shipment needs but base-data files leave
/// out: item identifiers and GST, location time windows and requirement
/// flags, invoice fields, and identifier string coercions. Only absent or
/// empty fields are touched.
pub fn enhance_shipment_payload(base: &Value) -> Value {
    let mut payload = base.clone();
    let has_shipment = payload
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|data| !data.is_empty())
        && payload["data"][0].is_object();
    if !has_shipment {
        return payload;
    }
    let shipment = &mut payload["data"][0];

    enhance_items(shipment);
    enhance_location(shipment, "pickup_location", pickup_location_defaults());
    enhance_location(shipment, "drop_location", drop_location_defaults());
    enhance_invoice(shipment);

    if shipment.get("e_waybill").is_some_and(Value::is_null) {
        shipment["e_waybill"] = json!("EWB123456789012345");
    }

    payload
}

fn enhance_items(shipment: &mut Value) {
    let Some(items) = shipment.get_mut("items").and_then(Value::as_array_mut) else {
        return;
    };
    let defaults = json!({
        "id": 1,
        "currency_code": "INR",
        "gst": {"cgst": 9, "sgst": 9, "igst": 18}
    });
    for item in items {
        apply_defaults(item, &defaults);
    }
}

fn enhance_location(shipment: &mut Value, location_key: &str, defaults: Value) {
    let Some(location) = shipment.get_mut(location_key) else {
        return;
    };
    apply_defaults(location, &defaults);

    if let Some(contact) = location.get_mut("contact_details").filter(|v| v.is_object()) {
        apply_defaults(contact, &json!({"isd_code": "91"}));
    }

    if let Some(pincode) = location.get("pincode").and_then(Value::as_i64) {
        location["pincode"] = json!(pincode.to_string());
    }

    if location.get("location_name").is_none() {
        if let Some(name) = location.get("name").cloned() {
            location["location_name"] = name;
        }
    }
}

fn enhance_invoice(shipment: &mut Value) {
    let Some(invoice) = shipment.get_mut("invoice") else {
        return;
    };
    apply_defaults(
        invoice,
        &json!({
            "currency_code": "INR",
            "seller_gstin": "22ABCDE1234F1Z5",
            "gst": {"cgst": 9, "sgst": 9, "igst": 18}
        }),
    );

    match invoice.get("invoice_number") {
        Some(Value::Number(number)) => {
            invoice["invoice_number"] = json!(number.to_string());
        }
        None => {
            invoice["invoice_number"] = json!("12345");
        }
        Some(_) => {}
    }
}

fn apply_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_map), Some(default_map)) = (target.as_object_mut(), defaults.as_object())
    else {
        return;
    };
    for (key, default_value) in default_map {
        let needs_default = match target_map.get(key) {
            None => true,
            Some(existing) => is_empty_value(existing),
        };
        if needs_default {
            target_map.insert(key.clone(), default_value.clone());
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn pickup_location_defaults() -> Value {
    json!({
        "id": 1,
        "description": "Pickup location description",
        "complete_after": "2023-04-03T09:00:00Z",
        "complete_before": "2023-04-03T18:00:00Z",
        "otp_required": false,
        "image_required": false,
        "signature_required": false,
        "notes_required": false,
        "form_required": false,
        "location_hash": "hash123",
        "location_name": "Pickup Location",
        "slot_id": 123,
        "serviceability_code": "SERV001"
    })
}

fn drop_location_defaults() -> Value {
    json!({
        "id": 2,
        "description": "Drop location description",
        "complete_after": "2023-04-03T09:00:00Z",
        "complete_before": "2023-04-03T18:00:00Z",
        "otp_required": false,
        "image_required": false,
        "signature_required": false,
        "notes_required": false,
        "form_required": false,
        "location_hash": "hash456",
        "location_name": "Drop Location",
        "slot_id": 456,
        "serviceability_code": "SERV001"
    })
}
