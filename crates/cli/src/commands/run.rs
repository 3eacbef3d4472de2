//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut service = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref consumer_id) = args.consumer_id {
        info!(consumer_id = %consumer_id, "Overriding consumer id from CLI");
        service.service.consumer_id = consumer_id.clone();
    }
    if let Some(port) = args.metrics_port {
        info!(port = port, "Overriding metrics port from CLI");
        service.service.metrics_port = (port != 0).then_some(port);
    }
    config_loader::ConfigLoader::validate(&service).context("Invalid CLI override")?;

    info!(
        consumer_id = %service.service.consumer_id,
        sink = %service.sink.name,
        sink_type = service.sink.sink_type.as_str(),
        max_redeliveries = service.service.max_redeliveries,
        "Configuration loaded"
    );

    let pipeline_config = PipelineConfig {
        metrics_port: service.service.metrics_port,
        input: args.input.clone(),
        service,
    };

    info!("Starting consumer...");

    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        lines_read = stats.lines_read,
        published = stats.delivery.total_published,
        failed = stats.delivery.total_failed,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Consumer stopped"
    );
    stats.print_summary();

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves; the input still
/// ends the run.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
