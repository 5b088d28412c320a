//! Builders for trip and task request payloads.

use chrono::Utc;
use serde_json::{json, Value};

use crate::fixtures::DataError;

pub const DEFAULT_RIDER_ID: i64 = 254;
pub const DEFAULT_VEHICLE_ID: i64 = 866;

const PROVISIONAL_TRIP_ID: &str = "36b99ed9-ba95-4a7b-98d4-ffb7dcc152d2";
const TRIP_LATITUDE: f64 = 19.160079;
const TRIP_LONGITUDE: f64 = 72.844977;
const TASK_LATITUDE: f64 = 18.93068;
const TASK_LONGITUDE: f64 = 72.83209;
const TASK_IMAGE_FILENAME: &str = "210912324-1760683341788.jpg";
const TASK_NOTES: &str = "Task completion notes";

/// Builds the trip-creation payload: one pickup and one drop task per
/// shipment, interleaved so task index `2i` picks up shipment `i` and
/// `2i + 1` drops it.
pub fn trip_creation_payload(
    shipment_ids: &[String],
    rider_id: i64,
    vehicle_id: i64,
) -> Result<Value, DataError> {
    let mut tasks = Vec::with_capacity(shipment_ids.len() * 2);
    for (position, shipment_id) in shipment_ids.iter().enumerate() {
        let job_id = parse_identifier(shipment_id)?;
        tasks.push(json!({
            "index": position * 2,
            "job_id": job_id,
            "job_type": "shipment",
            "task_type": "pickup"
        }));
        tasks.push(json!({
            "index": position * 2 + 1,
            "job_id": job_id,
            "job_type": "shipment",
            "task_type": "drop"
        }));
    }

    Ok(json!({
        "data": [{
            "trip_index": 1,
            "rider_id": rider_id,
            "vehicle_id": vehicle_id,
            "provisional_trip_id": PROVISIONAL_TRIP_ID,
            "tasks": tasks,
            "estimated_distance": 55496,
            "estimated_travel_time": 6020,
            "route_polyline": null,
            "merge_trips": true
        }]
    }))
}

/// Builds the trip status-change payload for `event` (`start`, `complete`).
pub fn trip_status_payload(trip_id: &str, event: &str) -> Result<Value, DataError> {
    Ok(json!({
        "data": [{
            "trip_id": parse_identifier(trip_id)?,
            "event": event,
            "location": {
                "latitude": TRIP_LATITUDE,
                "longitude": TRIP_LONGITUDE
            },
            "distance_covered": 4123,
            "route_polyline": "abjkbhkajbkbbab000hhjhjbaj___cv"
        }]
    }))
}

/// Builds the task status-change payload for `event` (`start`, the
/// proof-of-work events, `complete`), stamped with the current time at
/// millisecond precision.
pub fn task_status_payload(task_id: &str, event: &str) -> Result<Value, DataError> {
    let event_time = format!("{}+04:00", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f"));
    Ok(json!({
        "data": [{
            "event": event,
            "event_time": event_time,
            "image_filenames": [TASK_IMAGE_FILENAME],
            "location": {
                "latitude": TASK_LATITUDE,
                "longitude": TASK_LONGITUDE
            },
            "notes": TASK_NOTES,
            "task_id": parse_identifier(task_id)?
        }]
    }))
}

/// Builds the OTP confirmation payload for a drop task.
pub fn task_otp_payload(otp: &str) -> Value {
    json!({
        "latitude": TASK_LATITUDE,
        "longitude": TASK_LONGITUDE,
        "otp": otp,
        "task_action": "completion"
    })
}

fn parse_identifier(value: &str) -> Result<i64, DataError> {
    value.parse::<i64>().map_err(|_| DataError::BadIdentifier {
        value: value.to_string(),
    })
}
