//! Sampler scheduler: one `tokio::task::spawn` per registered sampler,
//! each driven by its own interval, each tick shielded from both panics
//! and a stuck probe call. A small, cheaply-clonable struct wrapping
//! `Arc`-shared state, the same shape used elsewhere in this crate for
//! cheap-to-clone shared handles.

pub mod listening_sockets;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::SamplerError;
use crate::event::EventBatch;
use crate::platform::probe_timeout;
use crate::sampler::Sampler;
pub use listening_sockets::{ListeningSocketInfo, ListeningSocketsCache, SweeperHandle};

/// Cloning is cheap — clones share the same listening-sockets cache via
/// `Arc`.
#[derive(Clone)]
pub struct Scheduler {
    listening_sockets: ListeningSocketsCache,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            listening_sockets: ListeningSocketsCache::new(),
        }
    }

    pub fn listening_sockets(&self) -> &ListeningSocketsCache {
        &self.listening_sockets
    }

    pub fn spawn_listening_sockets_sweeper(&self) -> SweeperHandle {
        self.listening_sockets.spawn_sweeper()
    }

    /// Spawns one sampler as its own task. A disabled sampler
    /// (`interval() <= 0`) is never spawned; the returned handle's
    /// `stop()` is then an immediate no-op.
    pub fn spawn(
        &self,
        mut sampler: Box<dyn Sampler>,
        tx: mpsc::Sender<EventBatch>,
    ) -> SamplerHandle {
        let name = sampler.name();
        if sampler.disabled() {
            info!(sampler = name, "sampler disabled, not spawning");
            let (stop_tx, _) = watch::channel(true);
            return SamplerHandle {
                stop_tx,
                join: None,
            };
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let join = tokio::task::spawn(async move {
            sampler.on_startup();
            let interval = sampler.interval();
            let timeout = probe_timeout(interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match run_tick(&mut *sampler, timeout).await {
                            Ok(batch) => {
                                if tx.send(batch).await.is_err() {
                                    debug!(sampler = name, "event receiver dropped, stopping sampler");
                                    break;
                                }
                            }
                            Err(err) if err.is_trace_only() => {
                                tracing::trace!(sampler = name, error = %err, "sampler tick skipped");
                            }
                            Err(err) => {
                                warn!(sampler = name, error = %err, "sampler tick failed");
                            }
                        }
                    }
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            debug!(sampler = name, "stop requested, exiting sampler loop");
                            break;
                        }
                    }
                }
            }
        });

        SamplerHandle {
            stop_tx,
            join: Some(join),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one `sample()` call with a per-tick timeout and panic recovery.
/// The `AssertUnwindSafe`
/// wrapper is sound here: a caught panic discards `sampler`'s in-flight
/// call stack entirely rather than resuming it, so no torn invariant from
/// the panicking call can leak into a later tick.
async fn run_tick(
    sampler: &mut dyn Sampler,
    timeout: std::time::Duration,
) -> Result<EventBatch, SamplerError> {
    // `sample()` itself can panic synchronously while building the future
    // (before any `.await` point is reached), separately from a panic
    // while the future is later polled; both are caught so a single bad
    // tick never takes down the sampler's task.
    let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| sampler.sample())) {
        Ok(fut) => fut,
        Err(panic_payload) => return Err(SamplerError::from_panic_payload(panic_payload)),
    };
    let guarded = AssertUnwindSafe(fut);
    let outcome = tokio::time::timeout(timeout, guarded.catch_unwind()).await;

    match outcome {
        Ok(Ok(Ok(batch))) => Ok(batch),
        Ok(Ok(Err(sampler_err))) => Err(sampler_err),
        Ok(Err(panic_payload)) => Err(SamplerError::from_panic_payload(panic_payload)),
        Err(_elapsed) => Err(SamplerError::Timeout(timeout)),
    }
}

/// Handle to a spawned sampler task. Dropping it leaves the sampler
/// running; call `stop()` to request a clean shutdown.
pub struct SamplerHandle {
    stop_tx: watch::Sender<bool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl SamplerHandle {
    /// Requests the sampler loop to stop after its current tick (if any)
    /// and waits for the task to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Some(join) = self.join {
            let _ = join.await;
        }
    }
}
