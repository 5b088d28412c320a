//! Synthesis of deliberately-invalid field values.
//!
//! Case tables name either a concrete bad literal or a symbolic
//! `invalid_<field>` placeholder; placeholders expand here into a value wrong
//! for the field in the way the validation category calls for.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Closed set of negative-test categories. Case tables may use either the
/// bare tag or the original `<tag>_validation` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    #[serde(alias = "missing_field_validation")]
    MissingField,
    #[serde(alias = "data_type_validation")]
    DataType,
    #[serde(alias = "enum_validation")]
    Enum,
    #[serde(alias = "format_validation")]
    Format,
    #[serde(alias = "string_length_validation")]
    StringLength,
    #[serde(alias = "boundary_validation")]
    Boundary,
    Basic,
    #[serde(alias = "array_validation")]
    Array,
    Invoice,
    Item,
    #[serde(alias = "null_validation")]
    Null,
}

impl ValidationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::DataType => "data_type",
            Self::Enum => "enum",
            Self::Format => "format",
            Self::StringLength => "string_length",
            Self::Boundary => "boundary",
            Self::Basic => "basic",
            Self::Array => "array",
            Self::Invoice => "invoice",
            Self::Item => "item",
            Self::Null => "null",
        }
    }

    /// Categories whose dotless field paths set directly on the shipment
    /// object instead of walking a nested path.
    pub fn is_basic(self) -> bool {
        matches!(
            self,
            Self::Basic
                | Self::Boundary
                | Self::Enum
                | Self::DataType
                | Self::Format
                | Self::StringLength
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldClass {
    Numeric,
    Integer,
    Text,
    Boolean,
}

// Ordered most-specific first; classification takes the first set with a
// member contained in the field name.
const NUMERIC_FIELDS: &[&str] = &[
    "length",
    "width",
    "height",
    "weight",
    "quantity",
    "price_effective",
    "mrp",
    "latitude",
    "longitude",
    "amount",
    "cgst",
    "sgst",
    "igst",
    "installation_time",
];
const INTEGER_FIELDS: &[&str] = &["id", "slot_id"];
const STRING_FIELDS: &[&str] = &["pincode"];
const BOOLEAN_FIELDS: &[&str] = &[
    "otp_required",
    "image_required",
    "signature_required",
    "notes_required",
    "form_required",
    "mps",
    "pdsr_allowed",
];

fn classify_field(field_name: &str) -> Option<FieldClass> {
    let classes: [(&[&str], FieldClass); 4] = [
        (NUMERIC_FIELDS, FieldClass::Numeric),
        (INTEGER_FIELDS, FieldClass::Integer),
        (STRING_FIELDS, FieldClass::Text),
        (BOOLEAN_FIELDS, FieldClass::Boolean),
    ];
    classes
        .into_iter()
        .find(|(members, _)| members.iter().any(|member| field_name.contains(member)))
        .map(|(_, class)| class)
}

/// Expands `raw` into the value to inject at `field_path`. Non-placeholder
/// literals pass through, with numeric-looking strings coerced to numbers;
/// `invalid_`-prefixed placeholders dispatch on the category.
pub fn expand_invalid_value(raw: &Value, category: ValidationCategory, field_path: &str) -> Value {
    let coerced = coerce_numeric_literal(raw);
    let Some(text) = raw.as_str() else {
        return coerced;
    };
    if !text.starts_with("invalid_") {
        return coerced;
    }

    let field_name = field_path.rsplit('.').next().unwrap_or(field_path);
    match category {
        ValidationCategory::DataType => invalid_data_type_value(field_name),
        ValidationCategory::Enum => json!(format!("invalid_{field_name}")),
        ValidationCategory::Format => invalid_format_value(field_name),
        ValidationCategory::StringLength => invalid_string_length_value(field_name),
        ValidationCategory::Array => json!([]),
        _ => json!(format!("invalid_{field_name}")),
    }
}

fn invalid_data_type_value(field_name: &str) -> Value {
    match classify_field(field_name) {
        Some(FieldClass::Numeric) => json!("invalid_number"),
        Some(FieldClass::Integer) => {
            if field_name.contains("id") {
                json!("invalid_id")
            } else {
                json!("invalid_number")
            }
        }
        Some(FieldClass::Text) => json!(12345),
        Some(FieldClass::Boolean) => json!("invalid_boolean"),
        None => json!("invalid_value"),
    }
}

fn invalid_format_value(field_name: &str) -> Value {
    const FORMAT_BREAKERS: &[(&str, &str)] = &[
        ("datetime", "invalid-datetime-format"),
        ("complete_after", "invalid-datetime-format"),
        ("complete_before", "invalid-datetime-format"),
        ("url", "not-a-valid-url"),
        ("date", "invalid-date"),
    ];
    for (needle, broken) in FORMAT_BREAKERS {
        if field_name.contains(needle) {
            return json!(broken);
        }
    }
    json!("invalid-format")
}

fn invalid_string_length_value(field_name: &str) -> Value {
    const LENGTH_BREAKERS: &[(&str, usize)] = &[("hsn_code", 7), ("courier_identifier", 51)];
    for (needle, length) in LENGTH_BREAKERS {
        if field_name.contains(needle) {
            if *needle == "hsn_code" {
                return json!("1234567");
            }
            return json!("a".repeat(*length));
        }
    }
    json!("a".repeat(100))
}

fn coerce_numeric_literal(raw: &Value) -> Value {
    let Some(text) = raw.as_str() else {
        return raw.clone();
    };
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        if text.contains('.') {
            if let Ok(parsed) = text.parse::<f64>() {
                return json!(parsed);
            }
        } else if let Ok(parsed) = text.parse::<i64>() {
            return json!(parsed);
        }
    }
    raw.clone()
}
