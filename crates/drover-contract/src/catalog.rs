//! File-backed schema and API-configuration catalogs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("schema file not found: {path}")]
    SchemaNotFound { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("API '{api}' not found in configuration")]
    ApiNotConfigured { api: String },
}

/// Loads schema documents from a directory, caching each by name so repeated
/// validations of the same API reuse one parsed document.
#[derive(Debug)]
pub struct SchemaCatalog {
    schemas_dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<Value>>>,
}

impl SchemaCatalog {
    pub fn new(schemas_dir: impl Into<PathBuf>) -> Self {
        Self {
            schemas_dir: schemas_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the schema for `name` (`<name>.json` under the schema
    /// directory), serving repeat lookups from the cache.
    pub fn load(&self, name: &str) -> Result<Arc<Value>, ContractError> {
        let mut cache = self.cache.lock().expect("schema cache lock poisoned");
        if let Some(schema) = cache.get(name) {
            tracing::debug!(schema = name, "schema served from cache");
            return Ok(Arc::clone(schema));
        }

        let file_name = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        let path = self.schemas_dir.join(file_name);
        if !path.exists() {
            return Err(ContractError::SchemaNotFound { path });
        }

        let schema = Arc::new(read_json(&path)?);
        cache.insert(name.to_string(), Arc::clone(&schema));
        tracing::info!(schema = name, "schema loaded");
        Ok(schema)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiEntry {
    schema_file: String,
    base_data_file: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiConfigDocument {
    apis: HashMap<String, ApiEntry>,
}

/// Maps logical API names to their schema and base-payload files. Loaded once
/// from a JSON configuration document.
#[derive(Debug, Clone)]
pub struct ApiCatalog {
    apis: HashMap<String, ApiEntry>,
}

impl ApiCatalog {
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let document = read_json(path)?;
        let parsed: ApiConfigDocument =
            serde_json::from_value(document).map_err(|source| ContractError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(apis = parsed.apis.len(), "API configuration loaded");
        Ok(Self { apis: parsed.apis })
    }

    pub fn from_value(document: Value) -> Result<Self, ContractError> {
        let parsed: ApiConfigDocument =
            serde_json::from_value(document).map_err(|source| ContractError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        Ok(Self { apis: parsed.apis })
    }

    pub fn schema_file(&self, api: &str) -> Result<&str, ContractError> {
        self.entry(api).map(|entry| entry.schema_file.as_str())
    }

    pub fn base_data_file(&self, api: &str) -> Result<&str, ContractError> {
        self.entry(api).map(|entry| entry.base_data_file.as_str())
    }

    fn entry(&self, api: &str) -> Result<&ApiEntry, ContractError> {
        self.apis
            .get(api)
            .ok_or_else(|| ContractError::ApiNotConfigured {
                api: api.to_string(),
            })
    }
}

fn read_json(path: &Path) -> Result<Value, ContractError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ContractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ContractError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
