//! The `Sampler` contract: one trait implemented by every periodic
//! collector (system, process, heartbeat), driven uniformly by the
//! scheduler regardless of what it collects.

use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::SamplerResult;
use crate::event::EventBatch;

/// A single independently-paced periodic collector.
///
/// `sample()` runs to completion before the scheduler ticks this sampler
/// again. It returns a boxed future rather than a bare `SamplerResult` so
/// implementations that must await async I/O (container runtime clients,
/// `spawn_blocking`-wrapped OS probes) can do so directly on the
/// scheduler's own task instead of re-entering the runtime from a
/// synchronous call.
pub trait Sampler: Send {
    /// Human-readable name used in log lines and the entity key prefix.
    fn name(&self) -> &'static str;

    /// How often the scheduler should tick this sampler.
    fn interval(&self) -> Duration;

    /// Samplers with a non-positive configured interval are parked forever
    /// rather than spawned.
    fn disabled(&self) -> bool {
        self.interval().is_zero()
    }

    /// Called once before the first tick; gives a sampler a chance to warm
    /// any state that would otherwise make its first sample() misleading
    /// (e.g. priming a delta monitor). Default is a no-op.
    fn on_startup(&mut self) {}

    /// Produces one batch of events for the current tick.
    fn sample(&mut self) -> BoxFuture<'_, SamplerResult<EventBatch>>;
}
