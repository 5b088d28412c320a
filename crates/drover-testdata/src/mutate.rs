//! Path-based mutation of valid base payloads into negative-test payloads.
//!
//! Every mutation works on a structural clone; the caller's payload is never
//! touched. Field paths are relative to the first shipment object under
//! `data`, matching how the case tables are written.

use serde_json::{json, Value};

use drover_core::{remove_path, set_path};

use crate::invalid::{expand_invalid_value, ValidationCategory};

// Top-level shipment fields removable without a path walk.
const DIRECT_REMOVAL_FIELDS: &[&str] = &["pickup_location", "drop_location", "payment_method"];

/// Returns a clone of `base` with the invalid value for `category` injected
/// at `field_path`. Structural gaps on the way to the target (an absent
/// `packages` array, a missing first package) are repaired before the write.
pub fn apply_invalid_value(
    base: &Value,
    category: ValidationCategory,
    field_path: &str,
    raw: &Value,
) -> Value {
    let mut payload = base.clone();
    if !has_shipment(&payload) {
        return payload;
    }

    let value = expand_invalid_value(raw, category, field_path);

    if category == ValidationCategory::Array && field_path == "data" {
        if let Some(map) = payload.as_object_mut() {
            map.insert("data".to_string(), value);
        }
        return payload;
    }

    if !payload["data"][0].is_object() {
        return payload;
    }
    let shipment = &mut payload["data"][0];

    if category.is_basic() && !field_path.contains('.') {
        if let Some(map) = shipment.as_object_mut() {
            map.insert(field_path.to_string(), value);
        }
    } else {
        ensure_field_structure(shipment, field_path, category);
        set_path(shipment, field_path, value);
    }
    payload
}

/// Returns a clone of `base` with `field_path` removed, for missing-field
/// scenarios. Path `data` strips the whole collection; whitelisted top-level
/// fields pop directly from the first shipment; everything else removes via
/// the generalized nested walk.
pub fn remove_field(base: &Value, field_path: &str) -> Value {
    let mut payload = base.clone();

    if field_path == "data" {
        if let Some(map) = payload.as_object_mut() {
            map.remove("data");
        }
        return payload;
    }

    if !has_shipment(&payload) {
        return payload;
    }
    let shipment = &mut payload["data"][0];

    if DIRECT_REMOVAL_FIELDS.contains(&field_path) {
        if let Some(map) = shipment.as_object_mut() {
            map.remove(field_path);
        }
        return payload;
    }

    remove_path(shipment, field_path);
    payload
}

fn has_shipment(payload: &Value) -> bool {
    payload
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|data| !data.is_empty())
}

fn ensure_field_structure(shipment: &mut Value, field_path: &str, category: ValidationCategory) {
    if category == ValidationCategory::Invoice && shipment.get("invoice").is_none() {
        return;
    }
    if field_path.starts_with("packages.") {
        ensure_packages_structure(shipment, field_path);
    }
}

fn ensure_packages_structure(shipment: &mut Value, field_path: &str) {
    let Some(map) = shipment.as_object_mut() else {
        return;
    };
    if !map.get("packages").is_some_and(Value::is_array) {
        map.insert("packages".to_string(), json!([]));
    }
    let Some(packages) = map.get_mut("packages").and_then(Value::as_array_mut) else {
        return;
    };
    if field_path.starts_with("packages.0.") && packages.is_empty() {
        packages.push(json!({}));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{apply_invalid_value, remove_field};
    use crate::invalid::ValidationCategory;

    fn base_payload() -> serde_json::Value {
        json!({
            "data": [{
                "description": "e2e shipment",
                "payment_method": "cod",
                "pickup_location": {"name": "Warehouse 7", "pincode": "400001"},
                "drop_location": {"name": "Customer", "pincode": "400002"},
                "items": [{"name": "thing", "weight": 1.5}]
            }]
        })
    }

    #[test]
    fn mutation_never_touches_the_original() {
        let base = base_payload();
        let snapshot = base.clone();

        apply_invalid_value(
            &base,
            ValidationCategory::Enum,
            "payment_method",
            &json!("invalid_payment_method"),
        );
        apply_invalid_value(
            &base,
            ValidationCategory::Item,
            "packages.0.items.0.gst.cgst",
            &json!("not-a-number"),
        );
        remove_field(&base, "pickup_location");

        assert_eq!(base, snapshot);
    }

    #[test]
    fn basic_category_sets_dotless_fields_directly() {
        let mutated = apply_invalid_value(
            &base_payload(),
            ValidationCategory::Basic,
            "description",
            &json!(null),
        );
        assert_eq!(mutated["data"][0]["description"], json!(null));
    }

    #[test]
    fn nested_paths_walk_into_the_shipment() {
        let mutated = apply_invalid_value(
            &base_payload(),
            ValidationCategory::Format,
            "pickup_location.complete_before",
            &json!("invalid_complete_before"),
        );
        assert_eq!(
            mutated["data"][0]["pickup_location"]["complete_before"],
            json!("invalid-datetime-format")
        );
    }

    #[test]
    fn array_category_replaces_the_whole_collection() {
        let mutated = apply_invalid_value(
            &base_payload(),
            ValidationCategory::Array,
            "data",
            &json!("invalid_data"),
        );
        assert_eq!(mutated["data"], json!([]));
    }

    #[test]
    fn package_paths_repair_missing_structure_first() {
        let mutated = apply_invalid_value(
            &base_payload(),
            ValidationCategory::Item,
            "packages.0.items.0.gst.cgst",
            &json!("abc"),
        );
        assert_eq!(
            mutated["data"][0]["packages"][0]["items"][0]["gst"]["cgst"],
            json!("abc")
        );
    }

    #[test]
    fn invoice_category_skips_repair_when_invoice_is_absent() {
        let mutated = apply_invalid_value(
            &base_payload(),
            ValidationCategory::Invoice,
            "invoice.seller_gstin",
            &json!("invalid_seller_gstin"),
        );
        // No invoice in the base: the write still lands best-effort.
        assert_eq!(
            mutated["data"][0]["invoice"]["seller_gstin"],
            json!("invalid_seller_gstin")
        );
    }

    #[test]
    fn missing_field_removes_exactly_the_named_key() {
        let base = base_payload();
        let mutated = remove_field(&base, "pickup_location");

        let shipment = mutated["data"][0].as_object().expect("shipment object");
        assert!(!shipment.contains_key("pickup_location"));
        for key in ["description", "payment_method", "drop_location", "items"] {
            assert_eq!(shipment.get(key), base["data"][0].get(key), "sibling {key}");
        }
    }

    #[test]
    fn missing_field_on_data_drops_the_collection() {
        let mutated = remove_field(&base_payload(), "data");
        assert!(mutated.as_object().expect("payload").is_empty());
    }

    #[test]
    fn missing_field_walks_nested_paths() {
        let mutated = remove_field(&base_payload(), "items.0.name");
        assert!(mutated["data"][0]["items"][0].get("name").is_none());
        assert_eq!(mutated["data"][0]["items"][0]["weight"], json!(1.5));

        // List-head descent mirrors the original's depth handlers.
        let mutated = remove_field(&base_payload(), "items.weight");
        assert!(mutated["data"][0]["items"][0].get("weight").is_none());
    }

    #[test]
    fn payload_without_shipments_is_returned_unchanged() {
        let empty = json!({"data": []});
        let mutated = apply_invalid_value(
            &empty,
            ValidationCategory::Basic,
            "description",
            &json!("x"),
        );
        assert_eq!(mutated, empty);
    }
}
