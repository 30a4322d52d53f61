//! Storage delta monitor: turns the platform probe's cumulative
//! per-partition `DiskStats` into the delta-based `StorageSample` stream
//! that `disk::aggregate` consumes, the same "probe reports cumulative
//! counters, a monitor deltas them" split used by `CpuMonitor` for
//! `/proc/stat`.

use std::collections::HashMap;
use std::time::Instant;

use crate::disk::{aggregate, StorageSample};
use crate::event::StorageAggregate;
use crate::platform::DiskStats;

struct Previous {
    read_count: u64,
    write_count: u64,
    read_time_ms: u64,
    write_time_ms: u64,
    io_time_ms: u64,
    sampled_at: Instant,
}

pub struct StorageMonitor {
    previous: HashMap<String, Previous>,
}

impl StorageMonitor {
    pub fn new() -> Self {
        Self {
            previous: HashMap::new(),
        }
    }

    /// Deltas `current` against the prior pass's cumulative counters per
    /// device and aggregates the result. Devices seen for the first time
    /// report a zero delta rather than being dropped, since their
    /// total/free/used capacity is still meaningful immediately.
    pub fn sample(&mut self, current: Vec<DiskStats>) -> StorageAggregate {
        let now = Instant::now();
        let mut samples = Vec::with_capacity(current.len());

        for stats in current {
            let elapsed_ms = match self.previous.get(&stats.device) {
                Some(prev) => now.duration_since(prev.sampled_at).as_millis() as u64,
                None => 0,
            };
            let (read_count_delta, write_count_delta, read_time_delta_ms, write_time_delta_ms, io_time_delta_ms) =
                match self.previous.get(&stats.device) {
                    Some(prev) => (
                        stats.read_count.saturating_sub(prev.read_count),
                        stats.write_count.saturating_sub(prev.write_count),
                        stats.read_time_ms.saturating_sub(prev.read_time_ms),
                        stats.write_time_ms.saturating_sub(prev.write_time_ms),
                        stats.io_time_ms.saturating_sub(prev.io_time_ms),
                    ),
                    None => (0, 0, 0, 0, 0),
                };

            self.previous.insert(
                stats.device.clone(),
                Previous {
                    read_count: stats.read_count,
                    write_count: stats.write_count,
                    read_time_ms: stats.read_time_ms,
                    write_time_ms: stats.write_time_ms,
                    io_time_ms: stats.io_time_ms,
                    sampled_at: now,
                },
            );

            samples.push(StorageSample {
                device: stats.device,
                mountpoint: stats.mountpoint,
                filesystem_type: stats.filesystem_type,
                total_bytes: stats.total_bytes,
                free_bytes: stats.free_bytes,
                used_bytes: stats.used_bytes,
                read_time_delta_ms,
                write_time_delta_ms,
                io_time_delta_ms,
                read_count_delta,
                write_count_delta,
                elapsed_ms,
            });
        }

        aggregate(&samples)
    }
}

impl Default for StorageMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(device: &str, read_count: u64, io_time_ms: u64) -> DiskStats {
        DiskStats {
            device: device.to_string(),
            mountpoint: "/".to_string(),
            filesystem_type: "ext4".to_string(),
            total_bytes: 1000,
            free_bytes: 400,
            used_bytes: 600,
            read_time_ms: io_time_ms / 2,
            write_time_ms: io_time_ms / 2,
            io_time_ms,
            read_count,
            write_count: read_count,
        }
    }

    #[test]
    fn first_pass_reports_zero_deltas() {
        let mut monitor = StorageMonitor::new();
        let agg = monitor.sample(vec![stats("sda1", 100, 40)]);
        assert_eq!(agg.reads_per_sec, 0.0);
        assert_eq!(agg.writes_per_sec, 0.0);
        assert_eq!(agg.total_bytes, 1000);
    }

    #[test]
    fn second_pass_deltas_against_first() {
        let mut monitor = StorageMonitor::new();
        monitor.sample(vec![stats("sda1", 100, 40)]);
        let agg = monitor.sample(vec![stats("sda1", 150, 90)]);
        assert!(agg.device_count == 1);
        // elapsed_ms is derived from wall-clock Instant deltas in the test
        // environment; reads_per_sec is nonnegative and counts advanced.
        assert!(agg.reads_per_sec >= 0.0);
    }

    #[test]
    fn unknown_device_does_not_panic_on_first_observation() {
        let mut monitor = StorageMonitor::new();
        let agg = monitor.sample(vec![stats("nvme0n1", 10, 5)]);
        assert_eq!(agg.device_count, 1);
    }
}
