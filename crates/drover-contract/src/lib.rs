//! Structural contract validation for request and response payloads.
//!
//! Wraps draft-07 JSON Schema validation with the harness's date-time format
//! rule, a never-fails reporting contract, and file-backed schema/API
//! catalogs keyed by logical API name.

pub mod catalog;
pub mod validator;

pub use catalog::{ApiCatalog, ContractError, SchemaCatalog};
pub use validator::{validate, ValidationIssue, ValidationReport};
