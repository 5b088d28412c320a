//! Draft-07 payload validation with a harness-specific date-time rule.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use jsonschema::Draft;
use serde::Serialize;
use serde_json::Value;

const SUMMARY_ERROR_CAP: usize = 5;

/// One structural violation, anchored to both the payload location and the
/// schema rule that rejected it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationIssue {
    pub message: String,
    pub instance_path: String,
    pub schema_path: String,
    pub rule: String,
    pub rule_value: Value,
}

/// Outcome of validating one payload. Immutable once produced.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn passed() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Human-readable digest, capped at the first five errors plus a
    /// remainder count.
    pub fn summary(&self) -> String {
        if self.is_valid {
            return "Validation passed successfully".to_string();
        }

        let mut summary = format!("Validation failed with {} error(s):\n", self.errors.len());
        for (position, issue) in self.errors.iter().take(SUMMARY_ERROR_CAP).enumerate() {
            let at = if issue.instance_path.is_empty() {
                "root"
            } else {
                issue.instance_path.as_str()
            };
            summary.push_str(&format!("{}. {} (at: {at})\n", position + 1, issue.message));
        }
        if self.errors.len() > SUMMARY_ERROR_CAP {
            summary.push_str(&format!(
                "... and {} more errors",
                self.errors.len() - SUMMARY_ERROR_CAP
            ));
        }
        summary
    }
}

/// Validates `payload` against `schema`, collecting every violation instead
/// of stopping at the first. Never fails: an unbuildable schema surfaces as a
/// report carrying a single synthetic error.
pub fn validate(schema: &Value, payload: &Value) -> ValidationReport {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft7)
        .should_validate_formats(true)
        .with_format("date-time", is_harness_datetime)
        .build(schema);

    let compiled = match compiled {
        Ok(compiled) => compiled,
        Err(error) => {
            tracing::error!(%error, "contract validation aborted by schema error");
            return ValidationReport {
                is_valid: false,
                errors: vec![ValidationIssue {
                    message: format!("Validation error: {error}"),
                    instance_path: String::new(),
                    schema_path: String::new(),
                    rule: "exception".to_string(),
                    rule_value: Value::Null,
                }],
            };
        }
    };

    let errors: Vec<ValidationIssue> = compiled
        .iter_errors(payload)
        .map(|error| {
            let schema_path = error.schema_path().to_string();
            let issue = ValidationIssue {
                message: error.to_string(),
                instance_path: error.instance_path().to_string(),
                rule: rule_keyword(&schema_path),
                rule_value: schema.pointer(&schema_path).cloned().unwrap_or(Value::Null),
                schema_path,
            };
            tracing::warn!(
                message = issue.message,
                path = issue.instance_path,
                "validation error"
            );
            issue
        })
        .collect();

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn rule_keyword(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .unwrap_or_default()
        .to_string()
}

/// Accepts any ISO-8601 string the workflow's upstream tooling accepted:
/// RFC 3339 after normalizing a trailing `Z`, naive date-times with optional
/// fractional seconds, and bare dates.
fn is_harness_datetime(value: &str) -> bool {
    let normalized = match value.strip_suffix('Z') {
        Some(stem) => format!("{stem}+00:00"),
        None => value.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalized).is_ok()
        || NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").is_ok()
}
