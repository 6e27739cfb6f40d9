//! System Diagnostics
//!
//! Host information and display-discovery capabilities, logged once at
//! startup.

use sysinfo::System;
use tracing::info;

use crate::multimon::platform_enumerator;

/// System information for diagnostics
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Operating system name
    pub os_name: String,
    /// Operating system version string
    pub os_version: String,

    /// Kernel version string
    pub kernel_version: String,

    /// Number of logical CPU cores
    pub cpu_count: usize,

    /// Total system memory in megabytes
    pub total_memory_mb: u64,

    /// System hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Gather system information
    pub fn gather() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        Self {
            os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            cpu_count: sys.cpus().len(),
            total_memory_mb: sys.total_memory() / 1024 / 1024,
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    /// Log system information
    pub fn log(&self) {
        info!("=== System Information ===");
        info!("  OS: {} {}", self.os_name, self.os_version);
        info!("  Kernel: {}", self.kernel_version);
        info!("  Hostname: {}", self.hostname);
        info!("  CPUs: {}", self.cpu_count);
        info!("  Memory: {} MB", self.total_memory_mb);
    }
}

/// Whether this build can enumerate displays from the OS
pub fn os_enumeration_available() -> bool {
    platform_enumerator().is_some()
}

/// Log complete diagnostics on startup
pub fn log_startup_diagnostics() {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║          Startup Diagnostics                              ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    SystemInfo::gather().log();

    info!("=== Display Discovery ===");
    if os_enumeration_available() {
        info!("  OS enumeration: available");
    } else {
        info!("  OS enumeration: not available, static layouts only");
    }

    info!("=== Build ===");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    #[cfg(debug_assertions)]
    info!("  Build: debug");
    #[cfg(not(debug_assertions))]
    info!("  Build: release");

    info!("╚════════════════════════════════════════════════════════════╝");
}
