//! Platform-specific OS probe surface.
//!
//! One trait, one implementation selected at compile time via
//! `cfg(target_os = ...)`, rather than scattering `#[cfg]` branches through
//! every caller: `linux::LinuxProbe` is the fully-implemented target,
//! `stub::StubProbe` backs every other target with conservative defaults.

pub mod linux;
pub mod stub;

use std::time::Duration;

use anyhow::Result;

/// Per-process CPU time accounting, in fractional seconds since process
/// start (or since boot for system-wide totals).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessTimes {
    pub user_secs: f64,
    pub system_secs: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessMemory {
    pub rss_bytes: u64,
    pub vms_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Stopped,
    Zombie,
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessIoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
}

/// Aggregate per-CPU time counters, summed across all
/// cores. Units are platform "jiffies"/ticks on Linux; the CPU monitor only
/// ever looks at deltas, so the absolute tick rate never needs to leave
/// this module.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VirtualMemory {
    pub total_bytes: u64,
    pub free_bytes: u64,
    /// `MemAvailable` from `/proc/meminfo`, when the kernel reports it.
    pub available_bytes: Option<u64>,
    pub cached_bytes: u64,
    pub buffers_bytes: u64,
    pub slab_reclaimable_bytes: u64,
    pub slab_bytes: u64,
    pub shared_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwapMemory {
    pub total_bytes: u64,
    pub free_bytes: u64,
    /// Linux-only counters; `None` on platforms that don't report them.
    pub swap_in_pages: Option<u64>,
    pub swap_out_pages: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Cumulative per-partition counters as read directly off the platform
/// (e.g. one joined `/proc/diskstats`/`/proc/mounts` row on Linux). The
/// storage monitor deltas these across passes into a `StorageSample`;
/// the probe itself never computes a rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskStats {
    pub device: String,
    pub mountpoint: String,
    pub filesystem_type: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub read_time_ms: u64,
    pub write_time_ms: u64,
    pub io_time_ms: u64,
    pub read_count: u64,
    pub write_count: u64,
}

/// Platform-specific process and system probes. Implementations are
/// synchronous and potentially blocking; callers wrap them in
/// `tokio::task::spawn_blocking` plus a `tokio::time::timeout` so a stuck
/// probe call can never stretch past one sampling interval.
pub trait OsProbe: Send + Sync {
    fn list_pids(&self) -> Result<Vec<u32>>;
    fn process_times(&self, pid: u32) -> Result<ProcessTimes>;
    fn process_memory(&self, pid: u32) -> Result<ProcessMemory>;
    fn process_status(&self, pid: u32) -> Result<ProcessStatus>;
    fn process_user(&self, pid: u32) -> Result<String>;
    fn process_cmdline(&self, pid: u32) -> Result<Vec<String>>;
    fn process_io_counters(&self, pid: u32) -> Result<ProcessIoCounters>;
    fn process_fd_count(&self, pid: u32) -> Result<u32>;
    fn process_threads(&self, pid: u32) -> Result<u32>;
    fn process_parent(&self, pid: u32) -> Result<u32>;
    /// Monotonic-ish creation timestamp used as the second half of the
    /// process cache key. Any stable value that
    /// changes across a pid's death and reuse is sufficient; this is not
    /// required to be wall-clock accurate.
    fn process_creation_time(&self, pid: u32) -> Result<i64>;
    fn process_command_name(&self, pid: u32) -> Result<String>;

    fn system_times(&self) -> Result<SystemTimes>;
    fn virtual_memory(&self) -> Result<VirtualMemory>;
    fn swap_memory(&self) -> Result<SwapMemory>;
    fn load_average(&self) -> Result<LoadAverage>;
    fn disk_stats(&self) -> Result<Vec<DiskStats>>;
}

/// Selects the compiled-in probe for the current target.
pub fn current() -> Box<dyn OsProbe> {
    #[cfg(target_os = "linux")]
    {
        Box::new(linux::LinuxProbe::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(stub::StubProbe::new())
    }
}

/// Default per-call timeout derived from a sampler interval. Never
/// more than the interval itself and never less than one second, so a very
/// aggressive interval still gives in-flight probes a chance to finish.
pub fn probe_timeout(interval: Duration) -> Duration {
    interval.max(Duration::from_secs(1))
}
