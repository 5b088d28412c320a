//! Full workflow run wired the way the runner wires it: file-backed API and
//! schema catalogs, an enhanced base payload, and the orchestrator driving a
//! scripted service double through every stage.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use drover_client::{ApiCall, ApiTransport, CallOutcome, Credentials, RouteTable, TransportError};
use drover_contract::{ApiCatalog, SchemaCatalog};
use drover_testdata::DataLibrary;
use drover_workflow::{Orchestrator, RetryPolicy, WorkflowConfig, WorkflowError};

/// Serves each endpoint's scripted responses in order, repeating the final
/// one, so server-side state appears to advance as the workflow drives it.
struct ScriptedService {
    routes: Mutex<Vec<(String, Vec<CallOutcome>)>>,
}

impl ScriptedService {
    fn new(routes: Vec<(&str, Vec<CallOutcome>)>) -> Self {
        Self {
            routes: Mutex::new(
                routes
                    .into_iter()
                    .map(|(endpoint, responses)| (endpoint.to_string(), responses))
                    .collect(),
            ),
        }
    }
}

impl ApiTransport for ScriptedService {
    fn execute(&self, call: ApiCall) -> Result<CallOutcome, TransportError> {
        let mut routes = self.routes.lock().expect("routes lock");
        let (_, responses) = routes
            .iter_mut()
            .find(|(endpoint, _)| *endpoint == call.endpoint)
            .unwrap_or_else(|| panic!("unexpected endpoint: {}", call.endpoint));
        if responses.len() == 1 {
            Ok(responses[0].clone())
        } else {
            Ok(responses.remove(0))
        }
    }
}

fn outcome(body: serde_json::Value) -> CallOutcome {
    let success = body["success"].as_bool().unwrap_or(false);
    CallOutcome {
        status_code: 200,
        body,
        success,
        set_cookies: Vec::new(),
    }
}

fn login_outcome(cookie: &str) -> CallOutcome {
    let mut base = outcome(json!({
        "success": true,
        "user": {"workspace": [{"urmId": 9917}]}
    }));
    base.set_cookies = vec![cookie.to_string()];
    base
}

fn shipment_fetch(code: &str, display: &str, awb: &str) -> CallOutcome {
    outcome(json!({
        "success": true,
        "data": {"awb_number": awb, "status": {"status_code": code, "display_name": display}}
    }))
}

fn trip_info(display: &str, task_ids: &[u64]) -> CallOutcome {
    let tasks: Vec<serde_json::Value> = task_ids.iter().map(|id| json!({"id": id})).collect();
    outcome(json!({
        "success": true,
        "data": {"trip_id": 7001, "status": {"display_name": display}, "tasks": tasks}
    }))
}

fn trip_status(states: &[(&str, &str)]) -> CallOutcome {
    let tasks: Vec<serde_json::Value> = states
        .iter()
        .enumerate()
        .map(|(position, (code, display))| {
            json!({
                "id": position + 1,
                "task_type": if position % 2 == 0 { "pickup" } else { "drop" },
                "status": {"status_code": code, "display_name": display}
            })
        })
        .collect();
    outcome(json!({"success": true, "data": {"tasks": tasks}}))
}

fn task_details(with_otp: bool) -> CallOutcome {
    let proofs = if with_otp {
        json!({"otp": [{"meta": {"otp": 939345}}]})
    } else {
        json!({"otp": []})
    };
    outcome(json!({
        "success": true,
        "data": [{
            "status": {"status_code": "CR", "display_name": "Pending"},
            "proofs_of_work": proofs
        }]
    }))
}

fn scripted_service(details: CallOutcome) -> ScriptedService {
    let pending = ("CR", "Pending");
    let done = ("C", "Completed");
    ScriptedService::new(vec![
        ("auth/login", vec![login_outcome("sid=admin")]),
        ("auth/workspace-login/9917", vec![login_outcome("wsid=admin")]),
        ("rider/auth/login", vec![login_outcome("sid=rider")]),
        (
            "rider/auth/workspace-login/9917",
            vec![login_outcome("wsid=rider")],
        ),
        ("auth/logout", vec![outcome(json!({"success": true}))]),
        ("rider/auth/logout", vec![outcome(json!({"success": true}))]),
        (
            "shipments",
            vec![outcome(json!({
                "success": true,
                "data": [{"awb_number": "100"}, {"awb_number": "101"}]
            }))],
        ),
        (
            "shipments/100",
            vec![
                shipment_fetch("RA", "Driver Assigned", "100"),
                shipment_fetch("RA", "Driver Assigned", "100"),
                shipment_fetch("DL", "Delivery Completed", "100"),
            ],
        ),
        (
            "shipments/101",
            vec![
                shipment_fetch("RA", "Driver Assigned", "101"),
                shipment_fetch("RA", "Driver Assigned", "101"),
                shipment_fetch("DL", "Delivery Completed", "101"),
            ],
        ),
        (
            "trips",
            vec![outcome(json!({"success": true, "data": [{"trip_id": 7001}]}))],
        ),
        (
            "shipments/100/trip-info",
            vec![trip_info("Driver Assigned", &[1, 2])],
        ),
        (
            "shipments/101/trip-info",
            vec![trip_info("In Progress", &[3, 4])],
        ),
        ("tasks/details", vec![details]),
        ("tasks/status", vec![outcome(json!({"success": true}))]),
        (
            "tasks/2/proof_of_work/otp",
            vec![outcome(json!({"success": true}))],
        ),
        (
            "tasks/4/proof_of_work/otp",
            vec![outcome(json!({"success": true}))],
        ),
        (
            "trips/status",
            vec![
                outcome(json!({"success": true})),
                outcome(json!({
                    "success": true,
                    "data": [{"updated_status": {"trip": "C", "vehicle": "idle", "rider": "idle"}}]
                })),
            ],
        ),
        (
            "trips/status/7001",
            vec![
                trip_status(&[pending, pending, pending, pending]),
                trip_status(&[done, done, pending, pending]),
                trip_status(&[done, done, done, done]),
            ],
        ),
    ])
}

fn write_run_fixtures(root: &std::path::Path) {
    let data_dir = root.join("test_data");
    let schemas_dir = root.join("schemas");
    let config_dir = root.join("config");
    for dir in [&data_dir, &schemas_dir, &config_dir] {
        std::fs::create_dir_all(dir).expect("fixture dir");
    }

    std::fs::write(
        data_dir.join("create_shipment_base_data.json"),
        serde_json::to_string_pretty(&json!({
            "data": [
                {
                    "description": "first shipment",
                    "pickup_location": {"name": "Warehouse 7", "pincode": 400001},
                    "drop_location": {"name": "Customer A", "pincode": 400002}
                },
                {
                    "description": "second shipment",
                    "pickup_location": {"name": "Warehouse 7", "pincode": 400001},
                    "drop_location": {"name": "Customer B", "pincode": 400003}
                }
            ]
        }))
        .expect("serialize base data"),
    )
    .expect("write base data");

    std::fs::write(
        schemas_dir.join("create_shipment_schema.json"),
        serde_json::to_string_pretty(&json!({
            "type": "object",
            "required": ["data"],
            "properties": {
                "data": {
                    "type": "array",
                    "minItems": 2,
                    "items": {
                        "type": "object",
                        "required": ["description", "pickup_location", "drop_location"],
                        "properties": {
                            "pickup_location": {
                                "type": "object",
                                "properties": {
                                    "complete_before": {"type": "string", "format": "date-time"}
                                }
                            }
                        }
                    }
                }
            }
        }))
        .expect("serialize schema"),
    )
    .expect("write schema");

    std::fs::write(
        config_dir.join("api_config.json"),
        serde_json::to_string_pretty(&json!({
            "apis": {
                "create_shipment": {
                    "schema_file": "create_shipment_schema.json",
                    "base_data_file": "create_shipment_base_data.json"
                }
            }
        }))
        .expect("serialize api config"),
    )
    .expect("write api config");
}

fn workflow_config() -> WorkflowConfig {
    let mut config = WorkflowConfig::new(
        Credentials {
            username: "admin@example.com".to_string(),
            password: "secret".to_string(),
        },
        Credentials {
            username: "rider@example.com".to_string(),
            password: "secret".to_string(),
        },
    );
    config.fetch_retry = RetryPolicy::new(3, Duration::from_millis(0));
    config.trip_retry = RetryPolicy::new(3, Duration::from_millis(0));
    config
}

fn load_run_inputs(root: &std::path::Path) -> (serde_json::Value, serde_json::Value) {
    let api_catalog = ApiCatalog::load(&root.join("config/api_config.json")).expect("api catalog");
    let schema_catalog = SchemaCatalog::new(root.join("schemas"));
    let library = DataLibrary::new(root.join("test_data"));

    let schema = schema_catalog
        .load(api_catalog.schema_file("create_shipment").expect("schema file"))
        .expect("schema");
    let payload = library
        .shipment_payload(
            api_catalog
                .base_data_file("create_shipment")
                .expect("data file"),
        )
        .expect("payload");
    ((*schema).clone(), payload)
}

#[test]
fn file_backed_run_completes_every_stage() {
    let root = tempfile::tempdir().expect("tempdir");
    write_run_fixtures(root.path());
    let (schema, payload) = load_run_inputs(root.path());

    let transport = Arc::new(scripted_service(task_details(true)));
    let mut orchestrator = Orchestrator::new(
        transport as Arc<dyn ApiTransport>,
        RouteTable::default(),
        workflow_config(),
    );

    let report = orchestrator.run(&payload, &schema).expect("workflow run");
    assert_eq!(report.shipment_ids, vec!["100", "101"]);
    assert_eq!(report.trip_id, "7001");
    assert_eq!(report.completed_tasks, 4);
}

#[test]
fn a_drop_task_without_otp_aborts_the_whole_run() {
    let root = tempfile::tempdir().expect("tempdir");
    write_run_fixtures(root.path());
    let (schema, payload) = load_run_inputs(root.path());

    let transport = Arc::new(scripted_service(task_details(false)));
    let mut orchestrator = Orchestrator::new(
        transport as Arc<dyn ApiTransport>,
        RouteTable::default(),
        workflow_config(),
    );

    let error = orchestrator
        .run(&payload, &schema)
        .expect_err("missing OTP must fail the run");
    assert!(matches!(error, WorkflowError::MissingOtp { .. }));
}
