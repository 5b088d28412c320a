//! Test-data synthesis for workflow runs.
//!
//! Covers the base-payload library and its enhancement defaults, the
//! invalid-value synthesizer and payload mutator used for negative testing,
//! and the factory that builds trip/task request payloads.

pub mod factory;
pub mod fixtures;
pub mod invalid;
pub mod mutate;

pub use fixtures::{enhance_shipment_payload, DataError, DataLibrary, ValidationCase};
pub use invalid::{expand_invalid_value, ValidationCategory};
pub use mutate::{apply_invalid_value, remove_field};
