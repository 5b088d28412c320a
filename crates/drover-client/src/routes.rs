//! Endpoint routes for the logistics API.
//!
//! Exact paths are configuration data, not workflow logic: the defaults here
//! can be overridden wholesale by deserializing a routes document from the
//! run configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub login: String,
    pub workspace_login: String,
    pub logout: String,
    pub rider_login: String,
    pub rider_workspace_login: String,
    pub rider_logout: String,
    pub create_shipment: String,
    pub fetch_shipment: String,
    pub create_trip: String,
    pub trip_info: String,
    pub trip_status_update: String,
    pub trip_status_fetch: String,
    pub task_details: String,
    pub task_status_update: String,
    pub task_otp: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login: "auth/login".to_string(),
            workspace_login: "auth/workspace-login".to_string(),
            logout: "auth/logout".to_string(),
            rider_login: "rider/auth/login".to_string(),
            rider_workspace_login: "rider/auth/workspace-login".to_string(),
            rider_logout: "rider/auth/logout".to_string(),
            create_shipment: "shipments".to_string(),
            fetch_shipment: "shipments".to_string(),
            create_trip: "trips".to_string(),
            trip_info: "shipments".to_string(),
            trip_status_update: "trips/status".to_string(),
            trip_status_fetch: "trips/status".to_string(),
            task_details: "tasks/details".to_string(),
            task_status_update: "tasks/status".to_string(),
            task_otp: "tasks".to_string(),
        }
    }
}
