//! Process harvester: per-PID metrics, deltas against the previous
//! snapshot, cache reuse of immutable fields, and container decoration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::AgentConfig;
use crate::container::containerd::ContainerdClient;
use crate::container::docker::DockerClient;
use crate::container::Decorator;
use crate::error::{SamplerError, SamplerResult};
use crate::event::{now_ms, Event, EventBatch, EventBody, EventKind, ProcessSample, ProcessStatus as EventProcessStatus};
use crate::obfuscate::obfuscate_seq;
use crate::platform::{probe_timeout, OsProbe, ProcessIoCounters, ProcessStatus};
use crate::sampler::Sampler;
use futures::future::BoxFuture;

/// Key for the process cache: `(pid, creation_time)` so pid reuse across
/// process deaths never inherits stale metadata.
pub type ProcessKey = (u32, i64);

struct LastEmitted {
    ppid: u32,
    command_name: String,
    cmd_line: String,
    user: String,
    cpu_user_secs: f64,
    cpu_system_secs: f64,
    io: ProcessIoCounters,
    sampled_at: Instant,
}

struct CacheEntry {
    last_emitted: Option<LastEmitted>,
}

/// Optional hook resolving a human-readable service name for a pid.
/// Supplied per-harvester instead of a process-wide global.
pub type ServiceNameHook = Box<dyn Fn(u32) -> Option<String> + Send + Sync>;

/// Runs one probe call on a blocking thread, bounded by `timeout`. This is
/// the only sound way to bridge `OsProbe`'s synchronous, potentially
/// blocking calls into the scheduler's async task: `Handle::block_on`
/// panics if invoked from inside a runtime thread, which every caller here
/// is.
async fn call_probe<T, F>(probe: Arc<dyn OsProbe>, timeout: Duration, f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn OsProbe) -> anyhow::Result<T> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || f(&*probe))).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(anyhow::anyhow!("probe call panicked: {join_err}")),
        Err(_) => Err(anyhow::anyhow!("probe call timed out after {timeout:?}")),
    }
}

pub struct ProcessHarvester {
    probe: Arc<dyn OsProbe>,
    probe_timeout: Duration,
    zero_rss_filter: bool,
    strip_command_line: bool,
    privileged_mode: bool,
    cache: HashMap<ProcessKey, CacheEntry>,
    service_name_hook: Option<ServiceNameHook>,
}

impl ProcessHarvester {
    pub fn new(probe: Box<dyn OsProbe>, config: &AgentConfig) -> Self {
        Self {
            probe: Arc::from(probe),
            probe_timeout: probe_timeout(config.process_interval),
            zero_rss_filter: config.zero_rss_filter,
            strip_command_line: config.strip_command_line,
            privileged_mode: config.privileged_mode,
            cache: HashMap::new(),
            service_name_hook: None,
        }
    }

    pub fn with_service_name_hook(mut self, hook: ServiceNameHook) -> Self {
        self.service_name_hook = Some(hook);
        self
    }

    /// Runs one harvesting pass: lists pids, builds a `ProcessSample` for
    /// each survivor of the zero-RSS filter, applies every decorator, and
    /// prunes cache entries that weren't observed this pass. Every probe
    /// call is bounded by `probe_timeout` so one stuck call can't stretch
    /// the pass past a single sampling interval.
    pub async fn harvest(
        &mut self,
        decorators: &mut [Box<dyn Decorator>],
    ) -> anyhow::Result<Vec<ProcessSample>> {
        let pids = call_probe(self.probe.clone(), self.probe_timeout, |p| p.list_pids()).await?;
        let mut observed = Vec::with_capacity(pids.len());
        let mut samples = Vec::with_capacity(pids.len());

        for pid in pids {
            match self.harvest_one(pid).await {
                Ok(Some(mut sample)) => {
                    observed.push((sample.pid, sample.created_at_ms));
                    for decorator in decorators.iter_mut() {
                        decorator.decorate(&mut sample);
                    }
                    samples.push(sample);
                }
                Ok(None) => {
                    trace!(pid, "skipped pid (zero rss filter)");
                }
                Err(err) => {
                    // Transient probe failure: the pid disappeared, a
                    // /proc read raced a process exit, or the call timed
                    // out. Skip and continue.
                    debug!(pid, error = %err, "transient probe failure, skipping pid");
                }
            }
        }

        let observed_keys: std::collections::HashSet<ProcessKey> = observed.into_iter().collect();
        self.cache.retain(|key, _| observed_keys.contains(key));

        Ok(samples)
    }

    async fn harvest_one(&mut self, pid: u32) -> anyhow::Result<Option<ProcessSample>> {
        let probe = self.probe.clone();
        let timeout = self.probe_timeout;

        let created_at_ms = call_probe(probe.clone(), timeout, move |p| p.process_creation_time(pid)).await?;
        let key = (pid, created_at_ms);
        let is_new = !self.cache.contains_key(&key);
        if is_new {
            self.cache.insert(key, CacheEntry { last_emitted: None });
        }

        let mem = call_probe(probe.clone(), timeout, move |p| p.process_memory(pid)).await?;
        if mem.rss_bytes == 0 && self.zero_rss_filter {
            return Ok(None);
        }

        let (ppid, command_name, raw_cmdline, user) = {
            let cached = self.cache.get(&key).and_then(|e| e.last_emitted.as_ref());
            match cached {
                Some(last) => (
                    last.ppid,
                    last.command_name.clone(),
                    last.cmd_line.clone(),
                    last.user.clone(),
                ),
                None => {
                    let ppid = call_probe(probe.clone(), timeout, move |p| p.process_parent(pid))
                        .await
                        .unwrap_or(0);
                    let command_name =
                        call_probe(probe.clone(), timeout, move |p| p.process_command_name(pid))
                            .await
                            .unwrap_or_default();
                    let user = call_probe(probe.clone(), timeout, move |p| p.process_user(pid))
                        .await
                        .unwrap_or_default();
                    let args = call_probe(probe.clone(), timeout, move |p| p.process_cmdline(pid))
                        .await
                        .unwrap_or_default();
                    let sanitized = obfuscate_seq(&args).join(" ");
                    (ppid, command_name, sanitized, user)
                }
            }
        };

        let cmd_line = if self.strip_command_line {
            raw_cmdline
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        } else {
            raw_cmdline.clone()
        };

        let display_name = self
            .service_name_hook
            .as_ref()
            .and_then(|hook| hook(pid))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| command_name.clone());

        let status = map_status(
            call_probe(probe.clone(), timeout, move |p| p.process_status(pid))
                .await
                .unwrap_or(ProcessStatus::Unknown),
        );
        let thread_count = call_probe(probe.clone(), timeout, move |p| p.process_threads(pid))
            .await
            .unwrap_or(1);
        let fd_count = if self.privileged_mode {
            call_probe(probe.clone(), timeout, move |p| p.process_fd_count(pid))
                .await
                .ok()
        } else {
            None
        };

        let times = call_probe(probe.clone(), timeout, move |p| p.process_times(pid))
            .await
            .unwrap_or_default();
        let io = call_probe(probe.clone(), timeout, move |p| p.process_io_counters(pid))
            .await
            .unwrap_or_default();
        let now = Instant::now();

        let prev = self.cache.get(&key).and_then(|e| e.last_emitted.as_ref());
        let (cpu_percent, cpu_user_percent, cpu_system_percent) = match prev {
            Some(last) => {
                let elapsed = now.duration_since(last.sampled_at).as_secs_f64();
                if elapsed > 0.0 {
                    let d_user = (times.user_secs - last.cpu_user_secs).max(0.0);
                    let d_system = (times.system_secs - last.cpu_system_secs).max(0.0);
                    let cpu_pct = ((d_user + d_system) / elapsed * 100.0).clamp(0.0, 100.0);
                    if cpu_pct > 0.0 {
                        let user_pct = cpu_pct * d_user / (d_user + d_system).max(1e-9);
                        let system_pct = cpu_pct - user_pct;
                        (cpu_pct, user_pct, system_pct)
                    } else {
                        (0.0, 0.0, 0.0)
                    }
                } else {
                    (0.0, 0.0, 0.0)
                }
            }
            None => (0.0, 0.0, 0.0),
        };

        let (read_rate, write_rate) = match prev {
            Some(last) => {
                let elapsed = now.duration_since(last.sampled_at).as_secs_f64();
                (
                    nonneg_rate(io.read_bytes, last.io.read_bytes, elapsed),
                    nonneg_rate(io.write_bytes, last.io.write_bytes, elapsed),
                )
            }
            None => (None, None),
        };

        let sample = ProcessSample {
            pid,
            ppid,
            display_name,
            command_name: command_name.clone(),
            cmd_line,
            user: user.clone(),
            mem_rss_bytes: mem.rss_bytes,
            mem_vms_bytes: mem.vms_bytes,
            cpu_percent,
            cpu_user_percent,
            cpu_system_percent,
            status,
            thread_count,
            fd_count,
            created_at_ms,
            io_read_bytes: io.read_bytes,
            io_write_bytes: io.write_bytes,
            io_read_count: io.read_count,
            io_write_count: io.write_count,
            io_read_bytes_per_sec: read_rate,
            io_write_bytes_per_sec: write_rate,
            container_image_id: String::new(),
            container_image_name: String::new(),
            container_name: String::new(),
            container_id: String::new(),
            container_labels: HashMap::new(),
            contained: false,
        };

        if let Some(entry) = self.cache.get_mut(&key) {
            entry.last_emitted = Some(LastEmitted {
                ppid,
                command_name,
                cmd_line: raw_cmdline,
                user,
                cpu_user_secs: times.user_secs,
                cpu_system_secs: times.system_secs,
                io,
                sampled_at: now,
            });
        }

        Ok(Some(sample))
    }

    pub fn cached_pid_count(&self) -> usize {
        self.cache.len()
    }
}

fn map_status(status: ProcessStatus) -> EventProcessStatus {
    match status {
        ProcessStatus::Running => EventProcessStatus::Running,
        ProcessStatus::Sleeping => EventProcessStatus::Sleeping,
        ProcessStatus::Stopped => EventProcessStatus::Stopped,
        ProcessStatus::Zombie => EventProcessStatus::Zombie,
        ProcessStatus::Unknown => EventProcessStatus::Unknown,
    }
}

/// `rate = max(0, (cur-prev)/dt)`; counter wrap or decrease reports zero.
/// `None` when `elapsed <= 0` (no meaningful rate yet).
fn nonneg_rate(current: u64, previous: u64, elapsed_secs: f64) -> Option<f64> {
    if elapsed_secs <= 0.0 {
        return None;
    }
    if current < previous {
        return Some(0.0);
    }
    Some((current - previous) as f64 / elapsed_secs)
}

/// Flattens a `ProcessSample` into the `FlatProcessSample` wire shape via
/// the shared JSON flatten+sanitize utility.
pub fn to_flat_sample(sample: &ProcessSample) -> HashMap<String, String> {
    let value = serde_json::to_value(sample).unwrap_or(serde_json::Value::Null);
    crate::flatten::flatten_and_sanitize(&value)
}

/// `Sampler` driving one process-harvesting pass per tick: owns
/// the harvester plus both container runtime clients, builds a fresh
/// decorator set every pass, and converts the cache-pruned sample list into
/// an `EventBatch`.
pub struct ProcessSampler {
    harvester: ProcessHarvester,
    docker: DockerClient,
    containerd: ContainerdClient,
    interval: Duration,
    flat_events: bool,
}

impl ProcessSampler {
    pub fn new(probe: Box<dyn OsProbe>, config: &AgentConfig) -> Self {
        Self {
            harvester: ProcessHarvester::new(probe, config),
            docker: DockerClient::new(config),
            containerd: ContainerdClient::new(config),
            interval: config.process_interval,
            flat_events: config.flat_process_events,
        }
    }

    pub fn with_service_name_hook(mut self, hook: ServiceNameHook) -> Self {
        self.harvester = self.harvester.with_service_name_hook(hook);
        self
    }

    /// Builds this pass's decorator set from whichever container runtimes
    /// currently report themselves available. A runtime
    /// that fails to produce a decorator this pass is skipped with a
    /// warning rather than aborting the whole process sample.
    async fn build_decorators(&mut self) -> Vec<Box<dyn Decorator>> {
        let mut decorators: Vec<Box<dyn Decorator>> = Vec::new();

        if self.docker.enabled().await {
            match self.docker.new_decorator().await {
                Ok(decorator) => decorators.push(decorator),
                Err(err) => warn!(error = %err, "docker decorator pass failed"),
            }
        }

        if self.containerd.enabled().await {
            match self.containerd.new_decorator().await {
                Ok(decorator) => decorators.push(decorator),
                Err(err) => warn!(error = %err, "containerd decorator pass failed"),
            }
        }

        decorators
    }
}

impl Sampler for ProcessSampler {
    fn name(&self) -> &'static str {
        "process"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> BoxFuture<'_, SamplerResult<EventBatch>> {
        Box::pin(async move {
            let mut decorators = self.build_decorators().await;

            let samples = self
                .harvester
                .harvest(&mut decorators)
                .await
                .map_err(SamplerError::PassFatal)?;

            let timestamp_ms = now_ms();
            let events = samples
                .into_iter()
                .map(|sample| {
                    let entity_key = format!("pid:{}", sample.pid);
                    if self.flat_events {
                        Event {
                            kind: EventKind::FlatProcessSample,
                            entity_key,
                            timestamp_ms,
                            body: EventBody::FlatProcess(to_flat_sample(&sample)),
                        }
                    } else {
                        Event {
                            kind: EventKind::ProcessSample,
                            entity_key,
                            timestamp_ms,
                            body: EventBody::Process(Box::new(sample)),
                        }
                    }
                })
                .collect();

            Ok(events)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{
        LoadAverage, ProcessMemory, ProcessTimes, SwapMemory, SystemTimes, VirtualMemory,
    };
    use std::sync::Mutex;

    /// A scriptable `OsProbe` for harvester tests: each field is a
    /// per-pid map that the test populates up front.
    #[derive(Default)]
    struct FakeProbe {
        pids: Mutex<Vec<u32>>,
        rss: Mutex<HashMap<u32, u64>>,
        creation: Mutex<HashMap<u32, i64>>,
        times: Mutex<HashMap<u32, ProcessTimes>>,
        io: Mutex<HashMap<u32, ProcessIoCounters>>,
    }

    impl OsProbe for FakeProbe {
        fn list_pids(&self) -> anyhow::Result<Vec<u32>> {
            Ok(self.pids.lock().unwrap().clone())
        }
        fn process_times(&self, pid: u32) -> anyhow::Result<ProcessTimes> {
            Ok(self.times.lock().unwrap().get(&pid).copied().unwrap_or_default())
        }
        fn process_memory(&self, pid: u32) -> anyhow::Result<ProcessMemory> {
            Ok(ProcessMemory {
                rss_bytes: self.rss.lock().unwrap().get(&pid).copied().unwrap_or(0),
                vms_bytes: 0,
            })
        }
        fn process_status(&self, _pid: u32) -> anyhow::Result<ProcessStatus> {
            Ok(ProcessStatus::Running)
        }
        fn process_user(&self, _pid: u32) -> anyhow::Result<String> {
            Ok("root".into())
        }
        fn process_cmdline(&self, _pid: u32) -> anyhow::Result<Vec<String>> {
            Ok(vec!["myapp".into(), "--flag".into()])
        }
        fn process_io_counters(&self, pid: u32) -> anyhow::Result<ProcessIoCounters> {
            Ok(self.io.lock().unwrap().get(&pid).copied().unwrap_or_default())
        }
        fn process_fd_count(&self, _pid: u32) -> anyhow::Result<u32> {
            Ok(4)
        }
        fn process_threads(&self, _pid: u32) -> anyhow::Result<u32> {
            Ok(1)
        }
        fn process_parent(&self, _pid: u32) -> anyhow::Result<u32> {
            Ok(1)
        }
        fn process_creation_time(&self, pid: u32) -> anyhow::Result<i64> {
            Ok(self.creation.lock().unwrap().get(&pid).copied().unwrap_or(0))
        }
        fn process_command_name(&self, _pid: u32) -> anyhow::Result<String> {
            Ok("myapp".into())
        }
        fn system_times(&self) -> anyhow::Result<SystemTimes> {
            Ok(SystemTimes::default())
        }
        fn virtual_memory(&self) -> anyhow::Result<VirtualMemory> {
            Ok(VirtualMemory::default())
        }
        fn swap_memory(&self) -> anyhow::Result<SwapMemory> {
            Ok(SwapMemory::default())
        }
        fn load_average(&self) -> anyhow::Result<LoadAverage> {
            Ok(LoadAverage::default())
        }
        fn disk_stats(&self) -> anyhow::Result<Vec<crate::platform::DiskStats>> {
            Ok(Vec::new())
        }
    }

    fn base_config() -> AgentConfig {
        crate::config::tests::base_config()
    }

    #[tokio::test]
    async fn zero_rss_pid_is_skipped_when_filter_enabled() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 0)]);
        let mut harvester = ProcessHarvester::new(Box::new(probe), &base_config());
        let samples = harvester.harvest(&mut []).await.unwrap();
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn zero_rss_pid_is_kept_when_filter_disabled() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 0)]);
        let mut config = base_config();
        config.zero_rss_filter = false;
        let mut harvester = ProcessHarvester::new(Box::new(probe), &config);
        let samples = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[tokio::test]
    async fn first_sample_for_pid_has_no_io_rate_but_has_totals() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        *probe.io.lock().unwrap() = HashMap::from([(
            1,
            ProcessIoCounters {
                read_bytes: 500,
                write_bytes: 100,
                read_count: 5,
                write_count: 1,
            },
        )]);
        let mut harvester = ProcessHarvester::new(Box::new(probe), &base_config());
        let samples = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].io_read_bytes, 500);
        assert_eq!(samples[0].io_read_bytes_per_sec, None);
        assert_eq!(samples[0].cpu_percent, 0.0);
    }

    #[tokio::test]
    async fn pid_reuse_with_different_creation_time_does_not_inherit_prior_fields() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        *probe.creation.lock().unwrap() = HashMap::from([(1, 1000)]);
        let mut harvester = ProcessHarvester::new(Box::new(probe), &base_config());
        let first = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(first[0].created_at_ms, 1000);
        assert_eq!(harvester.cached_pid_count(), 1);

        // Same pid, new process (new creation time) within the same
        // harvester — the old (1, 1000) cache entry must not be inherited
        // by the new (1, 2000) process.
        let probe2 = FakeProbe::default();
        *probe2.pids.lock().unwrap() = vec![1];
        *probe2.rss.lock().unwrap() = HashMap::from([(1, 2048)]);
        *probe2.creation.lock().unwrap() = HashMap::from([(1, 2000)]);
        harvester.probe = Arc::new(probe2);
        let second = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(second[0].created_at_ms, 2000);
        assert_eq!(second[0].mem_rss_bytes, 2048);
        // Stale (1, 1000) entry is pruned, only the new key remains.
        assert_eq!(harvester.cached_pid_count(), 1);
    }

    #[tokio::test]
    async fn cache_prunes_pids_not_observed_this_pass() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1, 2];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 100), (2, 100)]);
        let mut harvester = ProcessHarvester::new(Box::new(probe), &base_config());
        harvester.harvest(&mut []).await.unwrap();
        assert_eq!(harvester.cached_pid_count(), 2);

        let probe2 = FakeProbe::default();
        *probe2.pids.lock().unwrap() = vec![1];
        *probe2.rss.lock().unwrap() = HashMap::from([(1, 100)]);
        harvester.probe = Arc::new(probe2);
        harvester.harvest(&mut []).await.unwrap();
        assert_eq!(harvester.cached_pid_count(), 1);
    }

    #[tokio::test]
    async fn service_name_hook_overrides_display_name() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        let harvester = ProcessHarvester::new(Box::new(probe), &base_config())
            .with_service_name_hook(Box::new(|pid| if pid == 1 { Some("svc-1".into()) } else { None }));
        let mut harvester = harvester;
        let samples = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(samples[0].display_name, "svc-1");
    }

    #[tokio::test]
    async fn strip_command_line_keeps_only_executable() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        let mut config = base_config();
        config.strip_command_line = true;
        let mut harvester = ProcessHarvester::new(Box::new(probe), &config);
        let samples = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(samples[0].cmd_line, "myapp");
    }

    #[tokio::test]
    async fn fd_count_only_collected_in_privileged_mode() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        let mut harvester = ProcessHarvester::new(Box::new(probe), &base_config());
        let samples = harvester.harvest(&mut []).await.unwrap();
        assert_eq!(samples[0].fd_count, None);

        let probe2 = FakeProbe::default();
        *probe2.pids.lock().unwrap() = vec![1];
        *probe2.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        let mut config = base_config();
        config.privileged_mode = true;
        let mut harvester2 = ProcessHarvester::new(Box::new(probe2), &config);
        let samples2 = harvester2.harvest(&mut []).await.unwrap();
        assert_eq!(samples2[0].fd_count, Some(4));
    }

    #[tokio::test]
    async fn process_sampler_emits_one_event_per_surviving_pid() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1, 2];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024), (2, 2048)]);
        let mut sampler = ProcessSampler::new(Box::new(probe), &base_config());
        let batch = sampler.sample().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].kind, EventKind::ProcessSample);
        assert!(batch[0].entity_key.starts_with("pid:"));
    }

    #[tokio::test]
    async fn process_sampler_emits_flat_events_when_configured() {
        let probe = FakeProbe::default();
        *probe.pids.lock().unwrap() = vec![1];
        *probe.rss.lock().unwrap() = HashMap::from([(1, 1024)]);
        let mut config = base_config();
        config.flat_process_events = true;
        let mut sampler = ProcessSampler::new(Box::new(probe), &config);
        let batch = sampler.sample().await.unwrap();
        assert_eq!(batch[0].kind, EventKind::FlatProcessSample);
        match &batch[0].body {
            EventBody::FlatProcess(_) => {}
            _ => panic!("expected flat process body"),
        }
    }
}
