use prompt_gateway::config::GatewayConfig;
use prompt_gateway::lifecycle::{shutdown_signal, ShutdownOutcome};
use prompt_gateway::startup::Application;
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::process::ExitCode;
use std::time::Instant;

/// Exit code when the drain deadline elapsed with requests still running.
const EXIT_FORCED_SHUTDOWN: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let started_at = Instant::now();

    let config = match GatewayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(
        "prompt-gateway",
        &config.common.log_level,
        config.observability.log_dir.as_deref(),
        config.observability.otlp_endpoint.as_deref(),
    ) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    tracing::info!("Logging setup completed");

    match run(config, started_at).await {
        Ok(ShutdownOutcome::Clean) => ExitCode::SUCCESS,
        Ok(ShutdownOutcome::Forced { in_flight }) => {
            tracing::warn!(in_flight, "Shutdown completed with requests still in flight");
            ExitCode::from(EXIT_FORCED_SHUTDOWN)
        }
        Err(e) => {
            tracing::error!("Server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig, started_at: Instant) -> Result<ShutdownOutcome, AppError> {
    let app = Application::build(config, started_at).await?;
    app.run_until_stopped(shutdown_signal()).await
}
