use std::time::Duration;

/// Reclaimable-memory accounting policy for the memory monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimablePolicy {
    /// `available = free + buffers + cached + sreclaimable`.
    ReclaimableAsFree,
    /// Prefer the kernel's own `MemAvailable`; fall back to
    /// `free + buffers + cached`. Default.
    ReclaimableAsUsed,
}

impl Default for ReclaimablePolicy {
    fn default() -> Self {
        ReclaimablePolicy::ReclaimableAsUsed
    }
}

/// Top-level configuration for the sampling engine, loaded from the
/// environment. Mirrors the host-path overrides a containerized agent
/// needs to observe the underlying host.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Override for `/proc` (env: HOST_PROC).
    pub host_proc: String,
    /// Override for `/sys` (env: HOST_SYS).
    pub host_sys: String,
    /// Override for `/etc` (env: HOST_ETC).
    pub host_etc: String,
    /// Override for `/var` (env: HOST_VAR).
    pub host_var: String,

    /// System sampler interval (env: SYSTEM_SAMPLER_INTERVAL_SECS).
    pub system_interval: Duration,
    /// Process sampler interval (env: PROCESS_SAMPLER_INTERVAL_SECS).
    pub process_interval: Duration,
    /// Storage sampler interval (env: STORAGE_SAMPLER_INTERVAL_SECS).
    pub storage_interval: Duration,
    /// Heartbeat sampler interval (env: HEARTBEAT_SAMPLER_INTERVAL_SECS).
    pub heartbeat_interval: Duration,

    /// Drop processes with rss == 0 instead of emitting them (env:
    /// ZERO_RSS_FILTER, default true).
    pub zero_rss_filter: bool,
    /// Report only the executable path, not full argv, in command lines
    /// (env: STRIP_COMMAND_LINE, default false).
    pub strip_command_line: bool,
    /// Collect fd counts, which requires elevated privileges on most
    /// platforms (env: PRIVILEGED_MODE, default false).
    pub privileged_mode: bool,

    /// Memory accounting policy (env: RECLAIMABLE_POLICY, "free" or "used").
    pub reclaimable_policy: ReclaimablePolicy,

    /// TTL for the per-container pids cache (env: PIDS_CACHE_TTL_SECS).
    pub pids_cache_ttl: Duration,
    /// Max retries before a container runtime is permanently disabled
    /// (env: RUNTIME_RETRY_BUDGET).
    pub runtime_retry_budget: u32,

    /// Docker-in-containerd namespace to exclude from containerd
    /// enumeration (env: CONTAINERD_DOCKER_NAMESPACE).
    pub containerd_docker_namespace: String,
    /// Docker daemon socket/endpoint (env: DOCKER_HOST).
    pub docker_host: String,
    /// containerd gRPC socket path (env: CONTAINERD_SOCKET).
    pub containerd_socket: String,

    /// Size of the sanitize-filename memoization LRU (env:
    /// SANITIZE_CACHE_SIZE, default 1000).
    pub sanitize_cache_size: usize,

    /// Emit `FlatProcessSample` (flattened string map) instead of the typed
    /// `ProcessSample` body (env: FLAT_PROCESS_EVENTS, default false). An
    /// alternate wire shape, cheap to keep since flatten.rs is already
    /// required plumbing.
    pub flat_process_events: bool,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self {
            host_proc: std::env::var("HOST_PROC").unwrap_or_else(|_| "/proc".into()),
            host_sys: std::env::var("HOST_SYS").unwrap_or_else(|_| "/sys".into()),
            host_etc: std::env::var("HOST_ETC").unwrap_or_else(|_| "/etc".into()),
            host_var: std::env::var("HOST_VAR").unwrap_or_else(|_| "/var".into()),

            system_interval: secs_env("SYSTEM_SAMPLER_INTERVAL_SECS", 15),
            process_interval: secs_env("PROCESS_SAMPLER_INTERVAL_SECS", 20),
            storage_interval: secs_env("STORAGE_SAMPLER_INTERVAL_SECS", 20),
            heartbeat_interval: secs_env("HEARTBEAT_SAMPLER_INTERVAL_SECS", 30),

            zero_rss_filter: bool_env("ZERO_RSS_FILTER", true),
            strip_command_line: bool_env("STRIP_COMMAND_LINE", false),
            privileged_mode: bool_env("PRIVILEGED_MODE", false),

            reclaimable_policy: match std::env::var("RECLAIMABLE_POLICY").as_deref() {
                Ok("free") => ReclaimablePolicy::ReclaimableAsFree,
                _ => ReclaimablePolicy::ReclaimableAsUsed,
            },

            pids_cache_ttl: secs_env("PIDS_CACHE_TTL_SECS", 60),
            runtime_retry_budget: std::env::var("RUNTIME_RETRY_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),

            containerd_docker_namespace: std::env::var("CONTAINERD_DOCKER_NAMESPACE")
                .unwrap_or_else(|_| "moby".into()),
            docker_host: std::env::var("DOCKER_HOST")
                .unwrap_or_else(|_| "unix:///var/run/docker.sock".into()),
            containerd_socket: std::env::var("CONTAINERD_SOCKET")
                .unwrap_or_else(|_| "/run/containerd/containerd.sock".into()),

            sanitize_cache_size: std::env::var("SANITIZE_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),

            flat_process_events: bool_env("FLAT_PROCESS_EVENTS", false),
        }
    }

    /// Path to a file under the (possibly overridden) `/proc` root.
    pub fn proc_path(&self, rest: &str) -> String {
        format!("{}/{}", self.host_proc.trim_end_matches('/'), rest)
    }

    /// Path to a file under the (possibly overridden) `/sys` root.
    pub fn sys_path(&self, rest: &str) -> String {
        format!("{}/{}", self.host_sys.trim_end_matches('/'), rest)
    }
}

fn secs_env(key: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default_secs as i64);
    // Intervals of zero or negative disable the sampler; represented
    // as Duration::ZERO, which `Sampler::disabled()` treats as "off".
    if secs <= 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(secs as u64)
    }
}

fn bool_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a minimal `AgentConfig` with all fields defaulted, for tests
    /// to override specific fields via struct-update syntax.
    pub(crate) fn base_config() -> AgentConfig {
        AgentConfig {
            host_proc: "/proc".into(),
            host_sys: "/sys".into(),
            host_etc: "/etc".into(),
            host_var: "/var".into(),
            system_interval: Duration::from_secs(15),
            process_interval: Duration::from_secs(20),
            storage_interval: Duration::from_secs(20),
            heartbeat_interval: Duration::from_secs(30),
            zero_rss_filter: true,
            strip_command_line: false,
            privileged_mode: false,
            reclaimable_policy: ReclaimablePolicy::ReclaimableAsUsed,
            pids_cache_ttl: Duration::from_secs(60),
            runtime_retry_budget: 100,
            containerd_docker_namespace: "moby".into(),
            docker_host: "unix:///var/run/docker.sock".into(),
            containerd_socket: "/run/containerd/containerd.sock".into(),
            sanitize_cache_size: 1000,
            flat_process_events: false,
        }
    }

    #[test]
    fn proc_path_joins_override_root() {
        let cfg = AgentConfig {
            host_proc: "/host/proc".into(),
            ..base_config()
        };
        assert_eq!(cfg.proc_path("stat"), "/host/proc/stat");
    }

    #[test]
    fn proc_path_trims_trailing_slash() {
        let cfg = AgentConfig {
            host_proc: "/host/proc/".into(),
            ..base_config()
        };
        assert_eq!(cfg.proc_path("meminfo"), "/host/proc/meminfo");
    }

    #[test]
    fn zero_interval_maps_to_duration_zero() {
        // secs_env is private to this module; exercised indirectly via
        // bool/duration defaults above and directly here.
        assert_eq!(secs_env("DOES_NOT_EXIST_SO_USES_DEFAULT", 0), Duration::ZERO);
    }

    #[test]
    fn default_reclaimable_policy_is_used() {
        let cfg = base_config();
        assert_eq!(cfg.reclaimable_policy, ReclaimablePolicy::ReclaimableAsUsed);
    }
}
