//! Application startup and lifecycle management.
//!
//! `Application::build` verifies the steering templates, binds the listener
//! and moves the lifecycle to Running. `run_until_stopped` serves until the
//! shutdown future resolves, then drains in-flight requests for at most the
//! configured deadline.

use crate::config::GatewayConfig;
use crate::handlers;
use crate::lifecycle::{admission_middleware, Lifecycle, LifecycleState, ShutdownOutcome};
use crate::services::completion::openai::{OpenAiBackend, OpenAiConfig};
use crate::services::orchestrator::{NOTES_TEMPLATE, SUMMARY_TEMPLATE};
use crate::services::{
    CompletionBackend, CompletionClient, HealthReporter, PromptStore, RequestOrchestrator,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, get_service, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, request_log_middleware};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};

/// Upper bound for request bodies, template updates included.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub prompts: PromptStore,
    pub orchestrator: RequestOrchestrator,
    pub health: Arc<HealthReporter>,
    pub lifecycle: Lifecycle,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    lifecycle: Lifecycle,
    drain_deadline: Duration,
    backend_cancel: CancellationToken,
}

impl Application {
    /// Build the application against the configured OpenAI-compatible backend.
    pub async fn build(config: GatewayConfig, started_at: Instant) -> Result<Self, AppError> {
        let backend = OpenAiBackend::new(OpenAiConfig {
            api_key: config.backend.api_key.clone(),
            model: config.backend.model.clone(),
            base_url: config.backend.base_url.clone(),
            timeout: config.backend_timeout(),
        })?;

        tracing::info!(
            model = %config.backend.model,
            base_url = %config.backend.base_url,
            "Initialized completion backend"
        );

        Self::build_with_backend(config, Arc::new(backend), started_at).await
    }

    /// Build the application with the given backend.
    pub async fn build_with_backend(
        config: GatewayConfig,
        backend: Arc<dyn CompletionBackend>,
        started_at: Instant,
    ) -> Result<Self, AppError> {
        let lifecycle = Lifecycle::new();

        match Self::assemble(config, backend, started_at, lifecycle.clone()).await {
            Ok(app) => {
                lifecycle.transition(LifecycleState::Running)?;
                Ok(app)
            }
            Err(e) => {
                lifecycle.transition(LifecycleState::Stopped)?;
                Err(e)
            }
        }
    }

    async fn assemble(
        config: GatewayConfig,
        backend: Arc<dyn CompletionBackend>,
        started_at: Instant,
        lifecycle: Lifecycle,
    ) -> Result<Self, AppError> {
        let prompts = PromptStore::new(&config.storage.prompt_dir);
        for name in [NOTES_TEMPLATE, SUMMARY_TEMPLATE] {
            prompts.ensure_exists(name).await.map_err(|e| {
                tracing::error!("Error reading system prompt file {}: {}", name, e);
                AppError::ConfigError(anyhow::anyhow!(
                    "Required prompt template {} could not be read from {}: {}",
                    name,
                    config.storage.prompt_dir.display(),
                    e
                ))
            })?;
        }
        tracing::info!("System prompts loaded successfully");

        let backend_cancel = CancellationToken::new();
        let completions =
            CompletionClient::new(backend, config.backend_timeout(), backend_cancel.clone());

        let state = AppState {
            config: config.clone(),
            prompts: prompts.clone(),
            orchestrator: RequestOrchestrator::new(prompts, completions),
            health: Arc::new(HealthReporter::new(started_at, lifecycle.clone())),
            lifecycle: lifecycle.clone(),
        };

        let router = routes(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server is running on :{}", port);

        Ok(Self {
            port,
            listener,
            router,
            lifecycle,
            drain_deadline: config.drain_deadline(),
            backend_cancel,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Serve until `shutdown` resolves, then drain.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> Result<ShutdownOutcome, AppError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            router,
            lifecycle,
            drain_deadline,
            backend_cancel,
            ..
        } = self;

        let stop_accepting = CancellationToken::new();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(stop_accepting.clone().cancelled_owned())
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                lifecycle.transition(LifecycleState::Draining)?;
                lifecycle.transition(LifecycleState::Stopped)?;
                return match result {
                    Ok(()) => Ok(ShutdownOutcome::Clean),
                    Err(e) => {
                        tracing::error!("HTTP server error: {}", e);
                        Err(AppError::from(e))
                    }
                };
            }
            _ = shutdown => {}
        }

        tracing::info!("Shutting down server...");
        lifecycle.transition(LifecycleState::Draining)?;
        stop_accepting.cancel();

        let outcome = match tokio::time::timeout(drain_deadline, &mut server).await {
            Ok(Ok(())) => ShutdownOutcome::Clean,
            Ok(Err(e)) => {
                tracing::error!("HTTP server error during drain: {}", e);
                lifecycle.transition(LifecycleState::Stopped)?;
                return Err(AppError::from(e));
            }
            Err(_) => {
                let in_flight = lifecycle.in_flight();
                tracing::warn!(
                    in_flight,
                    deadline_secs = drain_deadline.as_secs_f64(),
                    "Server forced to shutdown: drain deadline exceeded"
                );
                backend_cancel.cancel();
                ShutdownOutcome::Forced { in_flight }
            }
        };

        lifecycle.transition(LifecycleState::Stopped)?;
        tracing::info!("Server exiting");
        Ok(outcome)
    }
}

fn routes(state: AppState) -> Router {
    let static_dir = state.config.storage.static_dir.clone();

    Router::new()
        .route(
            "/",
            get_service(ServeFile::new(static_dir.join("index.html"))),
        )
        .nest_service("/static", ServeDir::new(&static_dir))
        .route("/generate", post(handlers::generate))
        .route("/summary", post(handlers::summarize))
        .route(
            "/systemprompt",
            get(handlers::get_prompt).post(handlers::update_prompt),
        )
        .route("/health", get(handlers::health_check))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.lifecycle.clone(),
            admission_middleware,
        ))
        .layer(middleware::from_fn(request_log_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
