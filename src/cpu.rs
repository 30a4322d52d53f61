//! CPU monitor: delta-based CPU % across user/system/iowait/idle/steal,
//! derived from the same `/proc/stat`-delta shape as the host CPU
//! utilization figure, generalized to the full breakdown `CpuSample`
//! requires, plus the Windows-style alternative for platforms without
//! iowait/steal counters.

use tracing::warn;

use crate::event::CpuSample;
use crate::platform::SystemTimes;

/// Holds the previous per-CPU times snapshot so each call can compute a
/// delta against it. The first call after construction emits a zeroed
/// sample and primes the snapshot — this also covers the Windows-style
/// accounting below, whose first sample must return zeros, not an error.
pub struct CpuMonitor {
    previous: Option<SystemTimes>,
}

impl CpuMonitor {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Computes the next `CpuSample` from `current`, replacing the stored
    /// snapshot with it.
    pub fn sample(&mut self, current: SystemTimes) -> CpuSample {
        let previous = match self.previous.replace(current) {
            Some(p) => p,
            None => return CpuSample::zero(),
        };

        let d_user = (current.user + current.nice).saturating_sub(previous.user + previous.nice);
        let d_system = current.system.saturating_sub(previous.system);
        let d_iowait = current.iowait.saturating_sub(previous.iowait);
        // Paravirt quirk: steal can decrease when the hypervisor's
        // accounting catches up; clamp rather than let it go negative.
        let d_steal = current.steal.saturating_sub(previous.steal);
        let d_idle = current.idle.saturating_sub(previous.idle);
        let d_irq = current.irq.saturating_sub(previous.irq);
        let d_softirq = current.softirq.saturating_sub(previous.softirq);

        let total = d_user + d_system + d_iowait + d_steal + d_idle + d_irq + d_softirq;
        if total == 0 {
            return CpuSample::zero();
        }

        let total_f = total as f64;
        let user_pct = (d_user as f64 / total_f) * 100.0;
        let system_pct = ((d_system + d_irq + d_softirq) as f64 / total_f) * 100.0;
        let iowait_pct = (d_iowait as f64 / total_f) * 100.0;
        let steal_pct = (d_steal as f64 / total_f) * 100.0;
        let idle_pct = (100.0 - user_pct - system_pct - iowait_pct - steal_pct).max(0.0);
        let cpu_pct = user_pct + system_pct + iowait_pct + steal_pct;

        if cpu_pct < 0.0 {
            warn!(cpu_pct, "cpu monitor computed a negative cpu percent, clamping to zero");
        }

        CpuSample {
            cpu_percent: cpu_pct.max(0.0),
            cpu_user_percent: user_pct.max(0.0),
            cpu_system_percent: system_pct.max(0.0),
            cpu_iowait_percent: iowait_pct.max(0.0),
            cpu_idle_percent: idle_pct,
            cpu_steal_percent: steal_pct.max(0.0),
        }
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Windows-style CPU accounting: platforms that only expose
/// cumulative kernel/user/idle durations summed across cores, with no
/// separate iowait/steal breakdown. `kernel` and `user` here include
/// *all* non-idle time (the Win32 `GetSystemTimes` kernel counter already
/// includes idle, per the API's documented semantics, so callers must
/// subtract idle from kernel before passing it in — this function assumes
/// that has already been done). IOWait and Steal are fixed at zero.
pub fn windows_style_percent(
    prev_kernel_secs: f64,
    prev_user_secs: f64,
    prev_idle_secs: f64,
    cur_kernel_secs: f64,
    cur_user_secs: f64,
    cur_idle_secs: f64,
) -> CpuSample {
    let d_kernel = (cur_kernel_secs - prev_kernel_secs).max(0.0);
    let d_user = (cur_user_secs - prev_user_secs).max(0.0);
    let d_idle = (cur_idle_secs - prev_idle_secs).max(0.0);
    let total = d_kernel + d_user + d_idle;
    if total <= 0.0 {
        return CpuSample::zero();
    }
    let user_pct = (d_user / total) * 100.0;
    let system_pct = (d_kernel / total) * 100.0;
    let idle_pct = (d_idle / total) * 100.0;
    CpuSample {
        cpu_percent: (user_pct + system_pct).min(100.0),
        cpu_user_percent: user_pct,
        cpu_system_percent: system_pct,
        cpu_iowait_percent: 0.0,
        cpu_idle_percent: idle_pct,
        cpu_steal_percent: 0.0,
    }
}
