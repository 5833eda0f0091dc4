//! Process health snapshot.

use crate::dtos::HealthSnapshot;
use crate::lifecycle::Lifecycle;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, System};

pub struct HealthReporter {
    started_at: Instant,
    lifecycle: Lifecycle,
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl HealthReporter {
    /// `started_at` is the instant the process came up.
    pub fn new(started_at: Instant, lifecycle: Lifecycle) -> Self {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| tracing::warn!("Failed to resolve current pid: {}", e))
            .ok();

        Self {
            started_at,
            lifecycle,
            pid,
            system: Mutex::new(System::new()),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Never fails: unreadable samples are reported as zero.
    ///
    /// Blocks on `/proc` reads; async callers run it on the blocking pool.
    pub fn snapshot(&self) -> HealthSnapshot {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Usage is measured against the previous refresh, so the first sample is usually 0.
        system.refresh_cpu_usage();
        let cpu_usage = f64::from(system.global_cpu_usage());
        let cpu_usage = if cpu_usage.is_finite() {
            cpu_usage
        } else {
            tracing::warn!("Error getting CPU usage, reporting 0");
            0.0
        };

        let cpu_count = match system.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };

        let mem_bytes = self
            .pid
            .and_then(|pid| {
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                system.process(pid).map(|process| process.memory())
            })
            .unwrap_or(0);

        HealthSnapshot {
            status: "OK".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: format_uptime(self.uptime()),
            task_count: self.lifecycle.in_flight(),
            cpu_usage,
            cpu_count,
            mem_usage_mb: mem_bytes as f64 / 1024.0 / 1024.0,
        }
    }
}

/// Formats a duration as `1h2m3.456s`, dropping leading zero units.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = (total % 60) as f64 + f64::from(uptime.subsec_millis()) / 1000.0;

    if hours > 0 {
        format!("{}h{}m{:.3}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{:.3}s", minutes, seconds)
    } else {
        format!("{:.3}s", seconds)
    }
}
