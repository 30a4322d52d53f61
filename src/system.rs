//! System sampler: composes the CPU, load, memory and storage sub-monitors
//! into one `SystemSample` per tick, aborting the whole batch if any sub-monitor's
//! underlying probe call fails rather than emitting a partially-filled
//! sample.

use std::time::Duration;

use futures::future::BoxFuture;

use crate::config::AgentConfig;
use crate::cpu::CpuMonitor;
use crate::error::{SamplerError, SamplerResult};
use crate::event::{now_ms, Event, EventBatch, EventBody, EventKind, LoadSample, SystemSample};
use crate::memory::MemoryMonitor;
use crate::platform::OsProbe;
use crate::sampler::Sampler;
use crate::storage::StorageMonitor;

pub struct SystemSampler {
    probe: Box<dyn OsProbe>,
    interval: Duration,
    cpu: CpuMonitor,
    memory: MemoryMonitor,
    storage: StorageMonitor,
}

impl SystemSampler {
    pub fn new(probe: Box<dyn OsProbe>, config: &AgentConfig) -> Self {
        Self {
            probe,
            interval: config.system_interval,
            cpu: CpuMonitor::new(),
            memory: MemoryMonitor::new(config.reclaimable_policy),
            storage: StorageMonitor::new(),
        }
    }
}

impl Sampler for SystemSampler {
    fn name(&self) -> &'static str {
        "system"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> BoxFuture<'_, SamplerResult<EventBatch>> {
        let result = (|| {
            let times = self
                .probe
                .system_times()
                .map_err(SamplerError::PassFatal)?;
            let cpu = self.cpu.sample(times);

            let load_average = self
                .probe
                .load_average()
                .map_err(SamplerError::PassFatal)?;
            let load = LoadSample {
                load1: load_average.one,
                load5: load_average.five,
                load15: load_average.fifteen,
            };

            let virt = self
                .probe
                .virtual_memory()
                .map_err(SamplerError::PassFatal)?;
            let swap = self.probe.swap_memory().map_err(SamplerError::PassFatal)?;
            let memory = self.memory.sample(virt, swap);

            let disk_stats = self.probe.disk_stats().map_err(SamplerError::PassFatal)?;
            let disk = self.storage.sample(disk_stats);

            let sample = SystemSample {
                cpu: Some(cpu),
                load: Some(load),
                memory: Some(memory),
                disk: Some(disk),
            };

            Ok(vec![Event {
                kind: EventKind::SystemSample,
                entity_key: "host".to_string(),
                timestamp_ms: now_ms(),
                body: EventBody::System(Box::new(sample)),
            }])
        })();

        Box::pin(async move { result })
    }
}
