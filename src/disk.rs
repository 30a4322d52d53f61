//! Disk / storage aggregator: filters a stream of per-partition
//! samples and aggregates them into one `StorageAggregate` per pass.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::event::StorageAggregate;

const DOCKER_DEVICEMAPPER_PREFIX: &str = "/var/lib/docker/devicemapper";
const KUBELET_PREFIX: &str = "/var/lib/kubelet";

/// One per-partition reading, as produced by a platform-specific collector
/// (e.g. `/proc/diskstats` joined against `/proc/mounts` on Linux).
#[derive(Debug, Clone)]
pub struct StorageSample {
    pub device: String,
    pub mountpoint: String,
    pub filesystem_type: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub read_time_delta_ms: u64,
    pub write_time_delta_ms: u64,
    pub io_time_delta_ms: u64,
    pub read_count_delta: u64,
    pub write_count_delta: u64,
    pub elapsed_ms: u64,
}

/// Matches APFS-style device names that share total/free bytes per
/// physical disk across partitions (e.g. `disk1s1`, `disk1s5` both report
/// the totals of `disk1`). Has no matches on Linux device names.
static APFS_PHYSICAL_DISK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(disk\d+)s\d+$").expect("apfs disk regex must compile"));

/// Applies the filter rules (first-write-wins by device, drop
/// devicemapper/kubelet mountpoints) and returns the retained samples in
/// input order.
pub fn filter_samples(samples: &[StorageSample]) -> Vec<StorageSample> {
    let mut seen_devices = HashSet::new();
    let mut kept = Vec::new();
    for sample in samples {
        if !seen_devices.insert(sample.device.clone()) {
            continue;
        }
        if sample.mountpoint.contains(DOCKER_DEVICEMAPPER_PREFIX)
            || sample.mountpoint.contains(KUBELET_PREFIX)
        {
            continue;
        }
        kept.push(sample.clone());
    }
    kept
}

/// Aggregates a filtered sample set into one `StorageAggregate`, applying
/// the APFS shared-total/free dedup and the rate/utilization formulas.
pub fn aggregate(samples: &[StorageSample]) -> StorageAggregate {
    let filtered = filter_samples(samples);
    if filtered.is_empty() {
        return StorageAggregate::default();
    }

    let mut total_bytes = 0u64;
    let mut free_bytes = 0u64;
    let mut used_bytes = 0u64;
    let mut counted_physical_disks = HashSet::new();

    for sample in &filtered {
        let physical = APFS_PHYSICAL_DISK
            .captures(&sample.device)
            .map(|c| c[1].to_string());
        match physical {
            Some(disk) if !counted_physical_disks.insert(disk) => {
                // Same physical disk already counted; only `used` (derived
                // per-partition, not shared) accrues again.
                used_bytes += sample.used_bytes;
            }
            _ => {
                total_bytes += sample.total_bytes;
                free_bytes += sample.free_bytes;
                used_bytes += sample.used_bytes;
            }
        }
    }

    let total_read_count: u64 = filtered.iter().map(|s| s.read_count_delta).sum();
    let total_write_count: u64 = filtered.iter().map(|s| s.write_count_delta).sum();
    let total_io_time: u64 = filtered.iter().map(|s| s.io_time_delta_ms).sum();
    let total_read_time: u64 = filtered.iter().map(|s| s.read_time_delta_ms).sum();
    let total_write_time: u64 = filtered.iter().map(|s| s.write_time_delta_ms).sum();
    // All samples in one pass share (approximately) the same elapsed_ms;
    // using the first is equivalent to the per-device figure for the
    // "n_devices x elapsed_ms" denominator below.
    let elapsed_ms = filtered[0].elapsed_ms;
    let n_devices = filtered.len() as u64;

    let elapsed_secs = elapsed_ms as f64 / 1000.0;
    let reads_per_sec = if elapsed_secs > 0.0 {
        total_read_count as f64 / elapsed_secs
    } else {
        0.0
    };
    let writes_per_sec = if elapsed_secs > 0.0 {
        total_write_count as f64 / elapsed_secs
    } else {
        0.0
    };

    let denom = (n_devices * elapsed_ms) as f64;
    let utilization_percent = if denom > 0.0 {
        ((total_io_time as f64 / denom) * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let rw_time_total = total_read_time + total_write_time;
    let (read_utilization_percent, write_utilization_percent) = if rw_time_total > 0 {
        (
            utilization_percent * (total_read_time as f64 / rw_time_total as f64),
            utilization_percent * (total_write_time as f64 / rw_time_total as f64),
        )
    } else {
        (0.0, 0.0)
    };

    StorageAggregate {
        total_bytes,
        used_bytes,
        free_bytes,
        reads_per_sec,
        writes_per_sec,
        utilization_percent,
        read_utilization_percent,
        write_utilization_percent,
        device_count: filtered.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(device: &str, mountpoint: &str) -> StorageSample {
        StorageSample {
            device: device.to_string(),
            mountpoint: mountpoint.to_string(),
            filesystem_type: "ext4".to_string(),
            total_bytes: 1000,
            free_bytes: 400,
            used_bytes: 600,
            read_time_delta_ms: 30,
            write_time_delta_ms: 10,
            io_time_delta_ms: 40,
            read_count_delta: 100,
            write_count_delta: 50,
            elapsed_ms: 1000,
        }
    }

    #[test]
    fn scenario_filters_duplicates_and_excluded_mountpoints() {
        let samples = vec![
            sample("sda1", "/"),
            sample("sda2", "/home"),
            sample("sda1", "/duplicate"),
            sample("dm-0", "/var/lib/kubelet/x"),
            sample("dm-1", "/var/lib/docker/devicemapper/mnt/y"),
        ];
        let kept = filter_samples(&samples);
        let devices: Vec<&str> = kept.iter().map(|s| s.device.as_str()).collect();
        assert_eq!(devices, vec!["sda1", "sda2"]);
    }

    #[test]
    fn aggregate_sums_totals_across_retained_devices() {
        let samples = vec![sample("sda1", "/"), sample("sda2", "/home")];
        let agg = aggregate(&samples);
        assert_eq!(agg.total_bytes, 2000);
        assert_eq!(agg.used_bytes, 1200);
        assert_eq!(agg.device_count, 2);
    }

    #[test]
    fn reads_and_writes_per_sec_scale_by_elapsed_time() {
        let samples = vec![sample("sda1", "/")];
        let agg = aggregate(&samples);
        assert_eq!(agg.reads_per_sec, 100.0);
        assert_eq!(agg.writes_per_sec, 50.0);
    }

    #[test]
    fn utilization_percent_is_clamped_to_100() {
        let mut huge = sample("sda1", "/");
        huge.io_time_delta_ms = 10_000;
        let agg = aggregate(&[huge]);
        assert!(agg.utilization_percent <= 100.0);
    }

    #[test]
    fn read_write_utilization_split_proportionally() {
        let samples = vec![sample("sda1", "/")];
        let agg = aggregate(&samples);
        // read_time=30, write_time=10 -> read share 0.75, write share 0.25
        assert!((agg.read_utilization_percent - agg.utilization_percent * 0.75).abs() < 1e-9);
        assert!((agg.write_utilization_percent - agg.utilization_percent * 0.25).abs() < 1e-9);
    }

    #[test]
    fn zero_rw_time_yields_zero_utilization_split() {
        let mut s = sample("sda1", "/");
        s.read_time_delta_ms = 0;
        s.write_time_delta_ms = 0;
        let agg = aggregate(&[s]);
        assert_eq!(agg.read_utilization_percent, 0.0);
        assert_eq!(agg.write_utilization_percent, 0.0);
    }

    #[test]
    fn apfs_partitions_share_total_and_free_once_per_physical_disk() {
        let mut a = sample("disk1s1", "/");
        a.total_bytes = 5000;
        a.free_bytes = 2000;
        a.used_bytes = 100;
        let mut b = sample("disk1s5", "/system");
        b.total_bytes = 5000;
        b.free_bytes = 2000;
        b.used_bytes = 200;
        let agg = aggregate(&[a, b]);
        assert_eq!(agg.total_bytes, 5000);
        assert_eq!(agg.free_bytes, 2000);
        assert_eq!(agg.used_bytes, 300);
    }

    #[test]
    fn empty_input_yields_default_aggregate() {
        let agg = aggregate(&[]);
        assert_eq!(agg.device_count, 0);
        assert_eq!(agg.total_bytes, 0);
    }
}
