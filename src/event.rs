use std::collections::HashMap;

use serde::Serialize;

/// Milliseconds since the Unix epoch.
pub type TimestampMs = i64;

pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}

/// Tag identifying which body variant an [`Event`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SystemSample,
    ProcessSample,
    FlatProcessSample,
    HeartbeatSample,
}

/// A single typed telemetry record produced by a sampler.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub kind: EventKind,
    /// Stable identifier for the entity this event describes (e.g.
    /// "pid:1234" or the host identity for system-wide samples).
    pub entity_key: String,
    pub timestamp_ms: TimestampMs,
    pub body: EventBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    System(Box<SystemSample>),
    Process(Box<ProcessSample>),
    FlatProcess(HashMap<String, String>),
    Heartbeat(HeartbeatSample),
}

/// An ordered, in-memory sequence of events returned by one `sample()` call.
pub type EventBatch = Vec<Event>;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeartbeatSample {
    pub counter: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSample {
    pub cpu: Option<CpuSample>,
    pub load: Option<LoadSample>,
    pub memory: Option<MemorySample>,
    pub disk: Option<StorageAggregate>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CpuSample {
    pub cpu_percent: f64,
    pub cpu_user_percent: f64,
    pub cpu_system_percent: f64,
    pub cpu_iowait_percent: f64,
    pub cpu_idle_percent: f64,
    pub cpu_steal_percent: f64,
}

impl CpuSample {
    pub fn zero() -> Self {
        CpuSample {
            cpu_percent: 0.0,
            cpu_user_percent: 0.0,
            cpu_system_percent: 0.0,
            cpu_iowait_percent: 0.0,
            cpu_idle_percent: 100.0,
            cpu_steal_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoadSample {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SwapSample {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    /// Linux-only: pages swapped in since boot.
    pub swap_in: Option<u64>,
    /// Linux-only: pages swapped out since boot.
    pub swap_out: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MemorySample {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
    pub free_percent: f64,
    pub cached_bytes: u64,
    pub buffers_bytes: u64,
    pub slab_bytes: u64,
    pub shared_bytes: u64,
    pub swap: SwapSample,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageAggregate {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub reads_per_sec: f64,
    pub writes_per_sec: f64,
    pub utilization_percent: f64,
    pub read_utilization_percent: f64,
    pub write_utilization_percent: f64,
    pub device_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessSample {
    // identity
    pub pid: u32,
    pub ppid: u32,
    pub display_name: String,
    pub command_name: String,
    pub cmd_line: String,
    pub user: String,

    // memory
    pub mem_rss_bytes: u64,
    pub mem_vms_bytes: u64,

    // cpu
    pub cpu_percent: f64,
    pub cpu_user_percent: f64,
    pub cpu_system_percent: f64,

    // lifecycle
    pub status: ProcessStatus,
    pub thread_count: u32,
    pub fd_count: Option<u32>,
    pub created_at_ms: TimestampMs,

    // i/o — cumulative totals always present; rates absent on first sample
    pub io_read_bytes: u64,
    pub io_write_bytes: u64,
    pub io_read_count: u64,
    pub io_write_count: u64,
    pub io_read_bytes_per_sec: Option<f64>,
    pub io_write_bytes_per_sec: Option<f64>,

    // container attribution
    pub container_image_id: String,
    pub container_image_name: String,
    pub container_name: String,
    pub container_id: String,
    pub container_labels: HashMap<String, String>,
    pub contained: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Stopped,
    Zombie,
    Unknown,
}

impl ProcessSample {
    /// `"true"`/`"false"` rendering used by the flattened wire shape and by
    /// the `contained == "true" ⇒ non-empty container_id` invariant check.
    pub fn contained_str(&self) -> &'static str {
        if self.contained {
            "true"
        } else {
            "false"
        }
    }

    /// A contained sample must always carry a non-empty container id.
    pub fn invariants_hold(&self) -> bool {
        if self.contained && self.container_id.is_empty() {
            return false;
        }
        if self.cpu_percent > 0.0 {
            (self.cpu_user_percent + self.cpu_system_percent - self.cpu_percent).abs() < 0.01
        } else {
            self.cpu_user_percent == 0.0 && self.cpu_system_percent == 0.0
        }
    }
}

/// Minimal `ProcessSample` builder shared by this module's own tests and by
/// other modules (container decorators, the process sampler) that need a
/// throwaway sample to exercise against.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub(crate) fn minimal_sample_for_tests(pid: u32) -> ProcessSample {
        ProcessSample {
            pid,
            ppid: 1,
            display_name: "proc".into(),
            command_name: "proc".into(),
            cmd_line: "proc".into(),
            user: "root".into(),
            mem_rss_bytes: 1024,
            mem_vms_bytes: 2048,
            cpu_percent: 0.0,
            cpu_user_percent: 0.0,
            cpu_system_percent: 0.0,
            status: ProcessStatus::Running,
            thread_count: 1,
            fd_count: None,
            created_at_ms: 0,
            io_read_bytes: 0,
            io_write_bytes: 0,
            io_read_count: 0,
            io_write_count: 0,
            io_read_bytes_per_sec: None,
            io_write_bytes_per_sec: None,
            container_image_id: String::new(),
            container_image_name: String::new(),
            container_name: String::new(),
            container_id: String::new(),
            container_labels: HashMap::new(),
            contained: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::minimal_sample_for_tests as minimal_sample;
    use super::*;

    #[test]
    fn contained_without_id_violates_invariant() {
        let mut sample = minimal_sample(1);
        sample.contained = true;
        assert!(!sample.invariants_hold());
    }

    #[test]
    fn contained_with_id_holds_invariant() {
        let mut sample = minimal_sample(1);
        sample.contained = true;
        sample.container_id = "C1".into();
        assert!(sample.invariants_hold());
    }

    #[test]
    fn zero_cpu_requires_zero_components() {
        let sample = minimal_sample(1);
        assert!(sample.invariants_hold());
    }

    #[test]
    fn nonzero_cpu_components_must_sum() {
        let mut sample = minimal_sample(1);
        sample.cpu_percent = 50.0;
        sample.cpu_user_percent = 30.0;
        sample.cpu_system_percent = 20.0;
        assert!(sample.invariants_hold());

        sample.cpu_system_percent = 10.0;
        assert!(!sample.invariants_hold());
    }

    #[test]
    fn contained_str_matches_contained_flag() {
        let mut sample = minimal_sample(1);
        assert_eq!(sample.contained_str(), "false");
        sample.contained = true;
        assert_eq!(sample.contained_str(), "true");
    }

    #[test]
    fn cpu_sample_zero_has_full_idle() {
        let z = CpuSample::zero();
        assert_eq!(z.cpu_percent, 0.0);
        assert_eq!(z.cpu_idle_percent, 100.0);
    }
}
