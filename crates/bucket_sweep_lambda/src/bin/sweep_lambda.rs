use std::sync::Arc;

use bucket_sweep_core::config::SweepConfig;
use bucket_sweep_lambda::adapters::s3::S3ObjectStore;
use bucket_sweep_lambda::handlers::scheduled::{handle_scheduled_event, ApiGatewayResponse};
use bucket_sweep_lambda::pipeline::SweepOrchestrator;
use bucket_sweep_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

async fn handle_request(
    orchestrator: Arc<SweepOrchestrator<S3ObjectStore>>,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_scheduled_event(orchestrator.as_ref(), event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = SweepConfig::from_env().map_err(|config_error| {
        error!(error = %config_error, "invalid sweep configuration");
        Error::from(config_error)
    })?;
    info!(
        bucket = %config.bucket,
        region = config.region.as_deref().unwrap_or("default"),
        folders = ?config.scope.units(),
        expiration_days = config.policy.temporary_max_age.num_days(),
        "sweep lambda configured"
    );

    let store = S3ObjectStore::from_config(&config).await;
    let orchestrator = Arc::new(SweepOrchestrator::new(store, config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle_request(Arc::clone(&orchestrator), event)
    }))
    .await
}
