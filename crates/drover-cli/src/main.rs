//! Workflow-run entry point: configuration, logging, and orchestrator wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use drover_client::{Credentials, HttpClient, RouteTable};
use drover_contract::{ApiCatalog, SchemaCatalog};
use drover_testdata::DataLibrary;
use drover_workflow::{Orchestrator, RetryPolicy, WorkflowConfig};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "drover",
    about = "End-to-end workflow harness for the logistics API",
    version
)]
struct Cli {
    /// Base URL of the service under test.
    #[arg(long, env = "DROVER_BASE_URL")]
    base_url: String,

    /// Admin account used for shipment and trip management.
    #[arg(long, env = "DROVER_USERNAME")]
    username: String,
    #[arg(long, env = "DROVER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Rider account used for trip and task execution.
    #[arg(long, env = "DROVER_RIDER_USERNAME")]
    rider_username: String,
    #[arg(long, env = "DROVER_RIDER_PASSWORD", hide_env_values = true)]
    rider_password: String,

    /// Directory holding base payloads and validation-case tables.
    #[arg(long, default_value = "test_data")]
    data_dir: PathBuf,

    /// Directory holding JSON schema documents.
    #[arg(long, default_value = "schemas")]
    schemas_dir: PathBuf,

    /// JSON document mapping logical API names to schema and payload files.
    #[arg(long, default_value = "config/api_config.json")]
    api_config: PathBuf,

    /// Optional JSON document overriding the default endpoint routes.
    #[arg(long)]
    routes_file: Option<PathBuf>,

    /// Logical API name of the shipment-creation request.
    #[arg(long, default_value = "create_shipment")]
    shipment_api: String,

    #[arg(long, default_value_t = 3, value_parser = parse_positive_usize)]
    fetch_retry_attempts: usize,
    #[arg(long, default_value_t = 2_000)]
    fetch_retry_delay_ms: u64,
    #[arg(long, default_value_t = 3, value_parser = parse_positive_usize)]
    trip_retry_attempts: usize,
    #[arg(long, default_value_t = 5_000)]
    trip_retry_delay_ms: u64,

    #[arg(long, default_value_t = 254)]
    rider_id: i64,
    #[arg(long, default_value_t = 866)]
    vehicle_id: i64,
    #[arg(long, default_value_t = 2, value_parser = parse_positive_usize)]
    min_shipments: usize,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_routes(cli: &Cli) -> Result<RouteTable> {
    let Some(path) = &cli.routes_file else {
        return Ok(RouteTable::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read routes file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid routes document {}", path.display()))
}

fn build_workflow_config(cli: &Cli) -> WorkflowConfig {
    let mut config = WorkflowConfig::new(
        Credentials {
            username: cli.username.clone(),
            password: cli.password.clone(),
        },
        Credentials {
            username: cli.rider_username.clone(),
            password: cli.rider_password.clone(),
        },
    );
    config.rider_id = cli.rider_id;
    config.vehicle_id = cli.vehicle_id;
    config.min_shipments = cli.min_shipments;
    config.fetch_retry = RetryPolicy::new(
        cli.fetch_retry_attempts,
        Duration::from_millis(cli.fetch_retry_delay_ms),
    );
    config.trip_retry = RetryPolicy::new(
        cli.trip_retry_attempts,
        Duration::from_millis(cli.trip_retry_delay_ms),
    );
    config
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let routes = load_routes(&cli)?;
    let transport =
        Arc::new(HttpClient::new(cli.base_url.clone()).context("failed to build HTTP client")?);

    let api_catalog = ApiCatalog::load(&cli.api_config)?;
    let schema_catalog = SchemaCatalog::new(&cli.schemas_dir);
    let library = DataLibrary::new(&cli.data_dir);

    let schema = schema_catalog.load(api_catalog.schema_file(&cli.shipment_api)?)?;
    let payload = library.shipment_payload(api_catalog.base_data_file(&cli.shipment_api)?)?;

    let mut orchestrator = Orchestrator::new(transport, routes, build_workflow_config(&cli));
    match orchestrator.run(&payload, schema.as_ref()) {
        Ok(report) => {
            tracing::info!(
                shipments = report.shipment_ids.len(),
                trip_id = report.trip_id,
                completed_tasks = report.completed_tasks,
                "workflow run passed"
            );
            println!(
                "workflow passed: {} shipments on trip {} ({} tasks completed)",
                report.shipment_ids.len(),
                report.trip_id,
                report.completed_tasks
            );
            Ok(())
        }
        Err(error) => {
            tracing::error!(%error, "workflow run failed");
            bail!("workflow failed: {error}");
        }
    }
}
