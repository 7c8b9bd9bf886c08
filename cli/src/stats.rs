//! Host telemetry sampling.
//!
//! Wraps `sysinfo` behind a small pollable monitor. The numbers are purely
//! informational and never influence the copy itself; if the platform
//! reports nothing useful the display simply shows zeros.

use std::time::Instant;

use sysinfo::{Networks, System};

/// One snapshot of host utilization.
#[derive(Debug, Clone, Copy)]
pub struct HostStats {
    /// Global CPU utilization, 0–100
    pub cpu_percent: f32,

    /// Memory utilization, 0–100
    pub mem_percent: f32,

    /// Bytes per second sent across all interfaces since the last sample
    pub upload_bps: f64,

    /// Bytes per second received across all interfaces since the last sample
    pub download_bps: f64,
}

/// Pollable source of host statistics.
///
/// CPU figures need two refreshes some time apart, so the first sample
/// after construction may read as zero.
pub struct SystemMonitor {
    system: System,
    networks: Networks,
    last_sample: Instant,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        let networks = Networks::new_with_refreshed_list();
        SystemMonitor {
            system,
            networks,
            last_sample: Instant::now(),
        }
    }

    /// Take a fresh sample. Network rates are derived from interface
    /// counter deltas since the previous call.
    pub fn sample(&mut self) -> HostStats {
        let elapsed = self.last_sample.elapsed().as_secs_f64();
        self.last_sample = Instant::now();

        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.networks.refresh(true);

        let cpu_percent = self.system.global_cpu_usage();

        let total_memory = self.system.total_memory();
        let mem_percent = if total_memory > 0 {
            (self.system.used_memory() as f32 / total_memory as f32) * 100.0
        } else {
            0.0
        };

        let (received, transmitted) =
            self.networks
                .iter()
                .fold((0u64, 0u64), |(rx, tx), (_name, data)| {
                    (rx + data.received(), tx + data.transmitted())
                });

        let denominator = elapsed.max(f64::EPSILON);
        HostStats {
            cpu_percent,
            mem_percent,
            upload_bps: transmitted as f64 / denominator,
            download_bps: received as f64 / denominator,
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        SystemMonitor::new()
    }
}
