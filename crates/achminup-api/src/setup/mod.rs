//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::auth::{IdentityProvider, OidcUserInfoClient};
use crate::services::AssetService;
use crate::state::AppState;
use achminup_core::Config;
use achminup_processing::{ProcessRunner, ProcessorSet, ToolPaths, ToolRunner};
use achminup_storage::{OwnershipRegistry, Stager};
use achminup_worker::JobRunner;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    achminup_infra::init_telemetry(config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let identity = OidcUserInfoClient::new(
        config.userinfo_url(),
        Duration::from_secs(config.auth_timeout_secs),
    )?;

    let state = build_state(&config, Arc::new(identity), Arc::new(ProcessRunner)).await?;
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}

/// Create the stage directories and wire the services around one ownership lock.
pub async fn build_state(
    config: &Config,
    identity: Arc<dyn IdentityProvider>,
    tools: Arc<dyn ToolRunner>,
) -> Result<Arc<AppState>> {
    let stager = Stager::new(config.stages.clone());
    stager
        .ensure_layout()
        .await
        .context("Failed to create stage directories")?;

    let registry = OwnershipRegistry::new(Arc::new(Mutex::new(())));

    let processors = ProcessorSet::standard(
        tools,
        registry.clone(),
        &ToolPaths {
            transcoder: config.transcoder_path.clone(),
            probe: config.probe_path.clone(),
        },
    );
    let runner = JobRunner::new(Arc::new(processors));

    let assets = AssetService::new(
        stager,
        registry,
        runner,
        config.public_base_url.clone(),
        config.public_path.clone(),
        config.delete_mismatch_policy,
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        identity,
        assets,
    }))
}
