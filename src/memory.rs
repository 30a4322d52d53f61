//! Memory monitor: virtual + swap memory, with the reclaimable-as-free
//! vs reclaimable-as-used accounting policy selectable by `AgentConfig`.

use crate::config::ReclaimablePolicy;
use crate::event::{MemorySample, SwapSample};
use crate::platform::{SwapMemory, VirtualMemory};

pub struct MemoryMonitor {
    policy: ReclaimablePolicy,
}

impl MemoryMonitor {
    pub fn new(policy: ReclaimablePolicy) -> Self {
        Self { policy }
    }

    pub fn sample(&self, virt: VirtualMemory, swap: SwapMemory) -> MemorySample {
        let available_bytes = match self.policy {
            ReclaimablePolicy::ReclaimableAsFree => {
                virt.free_bytes + virt.buffers_bytes + virt.cached_bytes + virt.slab_reclaimable_bytes
            }
            ReclaimablePolicy::ReclaimableAsUsed => virt
                .available_bytes
                .unwrap_or(virt.free_bytes + virt.buffers_bytes + virt.cached_bytes),
        };
        let used_bytes = virt.total_bytes.saturating_sub(available_bytes);
        let (used_percent, free_percent) = if virt.total_bytes > 0 {
            let free_pct = (virt.free_bytes as f64 / virt.total_bytes as f64) * 100.0;
            (100.0 - free_pct, free_pct)
        } else {
            (0.0, 0.0)
        };

        MemorySample {
            total_bytes: virt.total_bytes,
            free_bytes: virt.free_bytes,
            available_bytes,
            used_bytes,
            used_percent,
            free_percent,
            cached_bytes: virt.cached_bytes,
            buffers_bytes: virt.buffers_bytes,
            slab_bytes: virt.slab_bytes,
            shared_bytes: virt.shared_bytes,
            swap: swap_sample(swap),
        }
    }
}

fn swap_sample(swap: SwapMemory) -> SwapSample {
    SwapSample {
        total_bytes: swap.total_bytes,
        free_bytes: swap.free_bytes,
        used_bytes: swap.total_bytes.saturating_sub(swap.free_bytes),
        // swap_in/swap_out are Linux-only; the stub probe reports
        // None on every other platform, which flows straight through.
        swap_in: swap.swap_in_pages,
        swap_out: swap.swap_out_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn virt(total: u64, free: u64, available: Option<u64>, cached: u64, buffers: u64) -> VirtualMemory {
        VirtualMemory {
            total_bytes: total,
            free_bytes: free,
            available_bytes: available,
            cached_bytes: cached,
            buffers_bytes: buffers,
            slab_reclaimable_bytes: 0,
            slab_bytes: 0,
            shared_bytes: 0,
        }
    }

    #[test]
    fn reclaimable_as_used_prefers_mem_available() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsUsed);
        let sample = monitor.sample(virt(1000, 100, Some(400), 200, 50), SwapMemory::default());
        assert_eq!(sample.available_bytes, 400);
        assert_eq!(sample.used_bytes, 600);
    }

    #[test]
    fn reclaimable_as_used_falls_back_without_mem_available() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsUsed);
        let sample = monitor.sample(virt(1000, 100, None, 200, 50), SwapMemory::default());
        assert_eq!(sample.available_bytes, 100 + 50 + 200);
    }

    #[test]
    fn reclaimable_as_free_sums_free_buffers_cached_sreclaimable() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsFree);
        let mut v = virt(1000, 100, Some(999_999), 200, 50);
        v.slab_reclaimable_bytes = 30;
        let sample = monitor.sample(v, SwapMemory::default());
        // ReclaimableAsFree ignores MemAvailable entirely.
        assert_eq!(sample.available_bytes, 100 + 50 + 200 + 30);
        assert_eq!(sample.used_bytes, 1000 - 380);
    }

    #[test]
    fn percent_fields_are_zero_when_total_is_zero() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsUsed);
        let sample = monitor.sample(virt(0, 0, None, 0, 0), SwapMemory::default());
        assert_eq!(sample.used_percent, 0.0);
        assert_eq!(sample.free_percent, 0.0);
    }

    #[test]
    fn percent_fields_derive_from_free_over_total() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsUsed);
        let sample = monitor.sample(virt(200, 50, Some(50), 0, 0), SwapMemory::default());
        assert_eq!(sample.free_percent, 25.0);
        assert_eq!(sample.used_percent, 75.0);
    }

    #[test]
    fn swap_in_out_pass_through_only_when_present() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsUsed);
        let swap = SwapMemory {
            total_bytes: 100,
            free_bytes: 40,
            swap_in_pages: Some(5),
            swap_out_pages: Some(3),
        };
        let sample = monitor.sample(virt(10, 10, Some(10), 0, 0), swap);
        assert_eq!(sample.swap.used_bytes, 60);
        assert_eq!(sample.swap.swap_in, Some(5));
        assert_eq!(sample.swap.swap_out, Some(3));
    }

    #[test]
    fn total_equals_free_plus_used_within_rounding() {
        let monitor = MemoryMonitor::new(ReclaimablePolicy::ReclaimableAsUsed);
        let sample = monitor.sample(virt(1000, 300, Some(450), 100, 50), SwapMemory::default());
        let diff = (sample.total_bytes as f64
            - (sample.available_bytes as f64 + sample.used_bytes as f64))
            .abs();
        assert!(diff <= 0.1);
    }
}
