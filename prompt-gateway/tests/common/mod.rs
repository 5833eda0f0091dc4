#![allow(dead_code)]

use prompt_gateway::config::{
    BackendConfig, GatewayConfig, ObservabilityConfig, ShutdownConfig, StorageConfig,
};
use prompt_gateway::lifecycle::{Lifecycle, ShutdownOutcome};
use prompt_gateway::services::completion::mock::MockBackend;
use prompt_gateway::startup::Application;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const NOTES_CONTENT: &str = "You are a release-notes assistant.";
pub const SUMMARY_CONTENT: &str = "You write one-line summaries.";
pub const INDEX_CONTENT: &str = "<html><body>prompt gateway</body></html>";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub root: PathBuf,
    pub lifecycle: Lifecycle,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<ShutdownOutcome, AppError>>>,
}

/// Creates a static tree with both steering templates under `target/`.
pub async fn seed_root() -> PathBuf {
    let root = PathBuf::from(format!("target/test-gateway-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(root.join("document"))
        .await
        .expect("Failed to create test directories");
    tokio::fs::write(root.join("index.html"), INDEX_CONTENT)
        .await
        .expect("Failed to write index");
    tokio::fs::write(root.join("document/notes.prompt"), NOTES_CONTENT)
        .await
        .expect("Failed to write notes template");
    tokio::fs::write(root.join("document/summary.prompt"), SUMMARY_CONTENT)
        .await
        .expect("Failed to write summary template");
    root
}

pub fn test_config(root: &Path, port: u16, drain_secs: u64) -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig {
            port,
            log_level: "info".to_string(),
        },
        backend: BackendConfig {
            api_key: "test-api-key".to_string(),
            model: "test-model".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 30,
        },
        storage: StorageConfig {
            static_dir: root.to_path_buf(),
            prompt_dir: root.join("document"),
        },
        shutdown: ShutdownConfig {
            drain_secs,
        },
        observability: ObservabilityConfig {
            log_dir: None,
            otlp_endpoint: None,
        },
    }
}

impl TestApp {
    pub async fn spawn(backend: MockBackend) -> Self {
        Self::spawn_with_drain(backend, 5).await
    }

    pub async fn spawn_with_drain(backend: MockBackend, drain_secs: u64) -> Self {
        let root = seed_root().await;
        let config = test_config(&root, 0, drain_secs);

        let app = Application::build_with_backend(config, Arc::new(backend), Instant::now())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let lifecycle = app.lifecycle().clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(app.run_until_stopped(async move {
            let _ = shutdown_rx.await;
        }));

        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to answer
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            root,
            lifecycle,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn prompt_path(&self, name: &str) -> PathBuf {
        self.root.join("document").join(name)
    }

    /// Raises the shutdown trigger without waiting for the drain.
    pub fn trigger_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Raises the shutdown trigger and waits for the server to stop.
    pub async fn shutdown(&mut self) -> ShutdownOutcome {
        self.trigger_shutdown();
        self.handle
            .take()
            .expect("Server already stopped")
            .await
            .expect("Server task panicked")
            .expect("Server returned an error")
    }

    /// Polls until `count` requests are inside a handler.
    pub async fn wait_for_in_flight(&self, count: usize) {
        for _ in 0..200 {
            if self.lifecycle.in_flight() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Timed out waiting for {} in-flight requests", count);
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.root).await;
    }
}
