//! Listening-sockets cache sweeper: a small, independently testable
//! building block for a per-PID listening-sockets cache (Unix) whose
//! background sweeper runs once every 10 minutes and takes a write lock;
//! reads take a read lock. Entries older than one hour are removed.
//!
//! The actual `/proc/net/tcp` inode-to-pid socket table parser this cache
//! would front has no named consumer in this crate's scope, so only the
//! cache + sweeper contract is implemented here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(600);
pub const ENTRY_TTL: Duration = Duration::from_secs(3600);

/// One resolved listening-socket-to-pid mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListeningSocketInfo {
    pub pid: u32,
}

struct Entry {
    info: ListeningSocketInfo,
    inserted_at: Instant,
}

/// Cloning is cheap — clones share the same underlying map via `Arc`.
#[derive(Clone)]
pub struct ListeningSocketsCache {
    entries: Arc<RwLock<HashMap<u64, Entry>>>,
}

impl ListeningSocketsCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, socket_inode: u64) -> Option<ListeningSocketInfo> {
        self.entries.read().get(&socket_inode).map(|e| e.info)
    }

    pub fn put(&self, socket_inode: u64, info: ListeningSocketInfo) {
        self.entries.write().insert(
            socket_inode,
            Entry {
                info,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry older than [`ENTRY_TTL`].
    pub fn sweep(&self) {
        let before = Instant::now();
        let mut guard = self.entries.write();
        let initial_len = guard.len();
        guard.retain(|_, entry| before.duration_since(entry.inserted_at) < ENTRY_TTL);
        let dropped = initial_len - guard.len();
        if dropped > 0 {
            debug!(dropped, remaining = guard.len(), "swept listening sockets cache");
        }
    }

    /// Spawns the periodic sweep task; dropping the returned stop sender
    /// (or calling `SweeperHandle::stop`) ends it.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        let cache = self.clone();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let join = tokio::task::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => cache.sweep(),
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        SweeperHandle { stop_tx, join }
    }
}

impl Default for ListeningSocketsCache {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SweeperHandle {
    stop_tx: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.join.await;
    }
}
