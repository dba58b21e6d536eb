//! File-keyed cache with external change invalidation
//!
//! Each entry pairs a cached value with a size+mtime snapshot of its file.
//! A background consumer drains change events from the monitor's channel,
//! coalesces bursts within a debounce window, and drops the affected entries
//! under the same lock the foreground accessors use; the snapshot comparison
//! on access catches changes that race a notification.

use crate::artifacts::monitor::file_monitor::{FileMonitor, lock};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// Size+mtime snapshot used to detect staleness independent of notifications
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileSnapshot {
    size: u64,
    mtime: SystemTime,
}

impl FileSnapshot {
    /// Snapshot the file as it currently is; None when it does not exist
    fn capture(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(FileSnapshot {
            size: metadata.len(),
            mtime: metadata.modified().ok()?,
        })
    }
}

/// One cached value plus the snapshot it was stored under
#[derive(Debug)]
struct MonitoredEntry<V> {
    value: V,
    snapshot: Option<FileSnapshot>,
}

type RefreshListener = Box<dyn Fn(&Path) + Send + Sync>;

/// Generic file-keyed cache invalidated by monitor notifications
///
/// `get`/`put`/`remove` are safe to call concurrently with asynchronous
/// notification delivery: one mutex guards the backing map for both the
/// foreground accessors and the consumer loop. Rapid successive changes to
/// the same file may coalesce into a single refresh; none are lost.
pub struct MonitoredFileMap<V> {
    entries: Arc<Mutex<HashMap<PathBuf, MonitoredEntry<V>>>>,
    listeners: Arc<Mutex<Vec<RefreshListener>>>,
    monitor: Arc<dyn FileMonitor>,
}

impl<V: Clone + Send + 'static> MonitoredFileMap<V> {
    /// Create a map invalidated by `monitor` notifications
    ///
    /// Change events arriving within `debounce` of each other are applied as
    /// one batch, so refresh storms from rapid successive writes collapse.
    pub fn new(monitor: Arc<dyn FileMonitor>, debounce: Duration) -> Self {
        let entries: Arc<Mutex<HashMap<PathBuf, MonitoredEntry<V>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let listeners: Arc<Mutex<Vec<RefreshListener>>> = Arc::new(Mutex::new(Vec::new()));

        let events = monitor.subscribe();
        Self::spawn_consumer(events, entries.clone(), listeners.clone(), debounce);

        MonitoredFileMap {
            entries,
            listeners,
            monitor,
        }
    }

    /// Store a value and register its file for change notifications
    pub fn put(&self, path: PathBuf, value: V) {
        let snapshot = FileSnapshot::capture(&path);

        if let Err(error) = self.monitor.monitor(&path) {
            // unwatchable files still work through the snapshot staleness check
            tracing::debug!("cannot monitor {}: {error}", path.display());
        }

        lock(&self.entries).insert(path, MonitoredEntry { value, snapshot });
    }

    /// Look up a cached value, re-validating its snapshot
    ///
    /// An entry whose file changed since it was stored is dropped and reported
    /// as absent, even when the notification has not been delivered yet.
    pub fn get(&self, path: &Path) -> Option<V> {
        let mut entries = lock(&self.entries);
        let entry = entries.get(path)?;

        if entry.snapshot != FileSnapshot::capture(path) {
            entries.remove(path);
            return None;
        }

        Some(entry.value.clone())
    }

    /// Drop a cached value and unregister its file
    pub fn remove(&self, path: &Path) -> Option<V> {
        if let Err(error) = self.monitor.unmonitor(path) {
            tracing::debug!("cannot unmonitor {}: {error}", path.display());
        }

        lock(&self.entries).remove(path).map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Register a callback fired after an entry is invalidated by a
    /// notification, so dependents can recompute
    pub fn on_refresh(&self, listener: impl Fn(&Path) + Send + Sync + 'static) {
        lock(&self.listeners).push(Box::new(listener));
    }

    /// Consumer loop: drain change events, coalesce within the debounce
    /// window, apply invalidations under the shared lock
    fn spawn_consumer(
        events: Receiver<PathBuf>,
        entries: Arc<Mutex<HashMap<PathBuf, MonitoredEntry<V>>>>,
        listeners: Arc<Mutex<Vec<RefreshListener>>>,
        debounce: Duration,
    ) {
        std::thread::Builder::new()
            .name("twig-file-monitor".to_string())
            .spawn(move || {
                while let Ok(first) = events.recv() {
                    let mut batch: HashSet<PathBuf> = HashSet::new();
                    batch.insert(first);

                    let deadline = Instant::now() + debounce;
                    loop {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        match events.recv_timeout(remaining) {
                            Ok(path) => {
                                batch.insert(path);
                            }
                            Err(RecvTimeoutError::Timeout) => break,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }

                    let invalidated: Vec<PathBuf> = {
                        let mut entries = lock(&entries);
                        batch
                            .into_iter()
                            .filter(|path| entries.remove(path).is_some())
                            .collect()
                    };

                    if invalidated.is_empty() {
                        continue;
                    }

                    tracing::debug!("invalidated {} monitored file(s)", invalidated.len());
                    let listeners = lock(&listeners);
                    for path in &invalidated {
                        for listener in listeners.iter() {
                            listener(path);
                        }
                    }
                }
            })
            .map(|_| ())
            .unwrap_or_else(|error| {
                // without a consumer the snapshot check still bounds staleness
                tracing::warn!("cannot spawn monitor consumer: {error}");
            });
    }
}
