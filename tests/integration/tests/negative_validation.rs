//! Case-table-driven negative scenarios: mutate a valid base payload, check
//! it against the request contract, submit it over real HTTP, and assert on
//! the service's rejection.

use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;

use drover_client::{ApiCall, ApiTransport, HttpClient};
use drover_contract::validate;
use drover_testdata::{apply_invalid_value, remove_field, DataLibrary, ValidationCategory};

fn write_fixtures(dir: &std::path::Path) {
    std::fs::write(
        dir.join("create_shipment_base_data.json"),
        serde_json::to_string_pretty(&json!({
            "data": [{
                "description": "integration shipment",
                "courier_identifier": "COURIER1",
                "payment_method": "cod",
                "pickup_location": {"name": "Warehouse 7", "pincode": 400001},
                "drop_location": {"name": "Customer", "pincode": 400002},
                "items": [{"name": "thing", "weight": 1.5}]
            }]
        }))
        .expect("serialize base data"),
    )
    .expect("write base data");

    std::fs::write(
        dir.join("validation_cases.json"),
        serde_json::to_string_pretty(&json!([
            {
                "validation_type": "enum_validation",
                "field_path": "payment_method",
                "invalid_value": "invalid_payment_method",
                "expected_error": "shipment_validation_failed",
                "description": "payment method outside the enum",
                "test_category": "enum"
            },
            {
                "validation_type": "format_validation",
                "field_path": "pickup_location.complete_before",
                "invalid_value": "invalid_complete_before",
                "expected_error": "schema_validation_failed",
                "description": "broken pickup window timestamp",
                "test_category": "format"
            },
            {
                "validation_type": "missing_field_validation",
                "field_path": "pickup_location",
                "expected_error": "shipment_validation_failed",
                "description": "pickup location stripped entirely",
                "test_category": "missing_field"
            }
        ]))
        .expect("serialize cases"),
    )
    .expect("write cases");
}

fn shipment_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["data"],
        "properties": {
            "data": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["description", "pickup_location", "drop_location"],
                    "properties": {
                        "payment_method": {"enum": ["prepaid", "cod"]},
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
    })
}

#[test]
fn mutated_payloads_fail_contract_and_are_rejected_by_the_service() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixtures(dir.path());
    let library = DataLibrary::new(dir.path());

    let base = library
        .shipment_payload("create_shipment_base_data.json")
        .expect("base payload");
    let cases = library
        .load_cases("validation_cases.json")
        .expect("case table");
    assert_eq!(cases.len(), 3);

    let schema = shipment_schema();

    // The enhanced base payload satisfies the contract before any mutation.
    let clean = validate(&schema, &base);
    assert!(clean.is_valid, "{}", clean.summary());

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/shipments");
        then.status(200).json_body(json!({
            "success": false,
            "failed_entries": [{"message": "shipment_validation_failed"}]
        }));
    });
    let client = HttpClient::new(server.base_url()).expect("client");

    for case in &cases {
        let mutated = if case.validation_type == ValidationCategory::MissingField {
            remove_field(&base, &case.field_path)
        } else {
            apply_invalid_value(&base, case.validation_type, &case.field_path, &case.invalid_value)
        };

        let report = validate(&schema, &mutated);
        assert!(
            !report.is_valid,
            "case '{}' should violate the contract",
            case.description
        );

        let outcome = client
            .execute(ApiCall::post("shipments", mutated).with_cookie("sid=test"))
            .expect("request");
        assert_eq!(outcome.status_code, 200);
        assert!(!outcome.success);
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("shipment_validation_failed"),
            "case '{}'",
            case.description
        );
    }
}

#[test]
fn enhancement_makes_the_raw_base_payload_submittable() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixtures(dir.path());
    let library = DataLibrary::new(dir.path());

    let raw = library
        .load_payload("create_shipment_base_data.json")
        .expect("raw payload");
    let enhanced = library
        .shipment_payload("create_shipment_base_data.json")
        .expect("enhanced payload");

    // The raw document has no time windows; enhancement adds them without
    // touching explicit values.
    assert!(raw["data"][0]["pickup_location"]
        .get("complete_before")
        .is_none());
    assert_eq!(
        enhanced["data"][0]["pickup_location"]["complete_before"],
        json!("2023-04-03T18:00:00Z")
    );
    assert_eq!(
        enhanced["data"][0]["pickup_location"]["pincode"],
        json!("400001")
    );
    assert_eq!(
        enhanced["data"][0]["pickup_location"]["name"],
        json!("Warehouse 7")
    );
}
