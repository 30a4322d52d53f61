//! Container decorator pipeline: discovers containers via pluggable
//! runtime clients, maps host pids to container metadata through the
//! TTL'd pids cache, and decorates process events.

pub mod containerd;
pub mod docker;

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::event::ProcessSample;

/// Metadata resolved for one container, attached to every `ProcessSample`
/// whose pid the container's task list reports.
#[derive(Debug, Clone, Default)]
pub struct ContainerMetadata {
    pub id: String,
    pub name: String,
    pub image_id: String,
    pub image_name: String,
    pub labels: HashMap<String, String>,
}

/// A one-shot object produced once per sampling pass by a container
/// runtime client, able to stamp container fields onto process samples for
/// the remainder of that pass.
pub trait Decorator: Send {
    fn decorate(&mut self, sample: &mut ProcessSample);
}

/// Applies resolved `pid -> ContainerMetadata` onto a `ProcessSample`,
/// shared by both the Docker and containerd decorators.
pub fn apply_metadata(sample: &mut ProcessSample, metadata: &ContainerMetadata) {
    sample.container_id = metadata.id.clone();
    sample.container_name = if metadata.name.is_empty() {
        metadata.id.clone()
    } else {
        metadata.name.clone()
    };
    sample.container_image_id = metadata.image_id.clone();
    sample.container_image_name = metadata.image_name.clone();
    sample.container_labels = metadata.labels.clone();
    sample.contained = true;
}

/// Decorator backed by a plain `pid -> ContainerMetadata` map, shared by
/// both concrete runtime clients once they've finished one enumeration
/// pass and built a `HashMap<pid, ContainerMetadata>`.
pub struct MapDecorator {
    by_pid: HashMap<u32, ContainerMetadata>,
}

impl MapDecorator {
    pub fn new(by_pid: HashMap<u32, ContainerMetadata>) -> Self {
        Self { by_pid }
    }
}

impl Decorator for MapDecorator {
    fn decorate(&mut self, sample: &mut ProcessSample) {
        if let Some(metadata) = self.by_pid.get(&sample.pid) {
            apply_metadata(sample, metadata);
        }
    }
}

/// Tracks a container runtime's retry budget: retries on subsequent
/// sampling passes up to a fixed budget before giving up permanently.
/// Modeled as a small state machine rather than a bare counter, so tests
/// can assert the terminal state directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAvailability {
    Probing { attempts: u32 },
    Available,
    Unavailable,
}

impl RuntimeAvailability {
    pub fn new() -> Self {
        RuntimeAvailability::Probing { attempts: 0 }
    }

    /// Records the result of one `enabled()` probe, advancing the state
    /// machine. Returns the new state.
    pub fn record_probe(&mut self, socket_present: bool, retry_budget: u32) -> &Self {
        *self = match (&self, socket_present) {
            (_, true) => RuntimeAvailability::Available,
            (RuntimeAvailability::Available, false) => {
                // A previously available runtime went away; start a fresh
                // retry budget rather than carrying over stale attempts.
                RuntimeAvailability::Probing { attempts: 1 }
            }
            (RuntimeAvailability::Probing { attempts }, false) => {
                let attempts = attempts + 1;
                if attempts >= retry_budget {
                    RuntimeAvailability::Unavailable
                } else {
                    RuntimeAvailability::Probing { attempts }
                }
            }
            (RuntimeAvailability::Unavailable, false) => RuntimeAvailability::Unavailable,
        };
        self
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, RuntimeAvailability::Available)
    }
}

impl Default for RuntimeAvailability {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedupes "Container ... is not running" log lines to at most once per
/// container id for the process lifetime, kept as a per-decorator field
/// rather than a process-wide global.
#[derive(Default)]
pub struct NotRunningDedupe {
    logged: HashSet<String>,
}

impl NotRunningDedupe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs the "container is not running" warning for `container_id` only
    /// the first time it's seen; subsequent calls for the same id are
    /// silently swallowed, other decorator errors always log.
    pub fn log_once(&mut self, container_id: &str, message: &str) {
        if self.logged.insert(container_id.to_string()) {
            warn!(container_id, message, "container not running");
        } else {
            debug!(container_id, "container not running (already logged)");
        }
    }
}

/// Extracts a container id from a runtime error message of the shape
/// `Container <id> is not running`. Returns `None` when the message
/// doesn't match that shape.
pub fn extract_not_running_id(message: &str) -> Option<String> {
    let after = message.strip_prefix("Container ")?;
    let id = after.split(' ').next()?;
    if after[id.len()..].trim_start().starts_with("is not running") {
        Some(id.to_string())
    } else {
        None
    }
}
