//! Foundational tree utilities shared across drover crates.
//!
//! Provides dotted/bracketed path access over `serde_json::Value` trees plus
//! a recursive object merge used by payload enhancement.

pub mod json_path;

pub use json_path::{deep_merge, get_path, get_path_string, remove_path, set_path};
