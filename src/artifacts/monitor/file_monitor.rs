//! External file-change notification
//!
//! `FileMonitor` is the collaborator that watches registered files and pushes
//! change events to subscribers on its own thread. `NotifyMonitor` backs the
//! trait with the platform watcher; `ManualMonitor` is an in-process
//! implementation for embedders (and tests) that deliver change events
//! themselves.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors from the file monitoring layer
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to create watcher: {0}")]
    WatcherCreation(#[from] notify::Error),

    #[error("Failed to watch path {path}: {source}")]
    WatchPath {
        path: PathBuf,
        source: notify::Error,
    },
}

/// Lock a mutex, recovering the guard from a poisoned lock
///
/// Invalidation state stays usable even if a notification thread panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers interest in files and pushes their change events to subscribers
///
/// Notifications arrive asynchronously on the monitor's own channel; multiple
/// rapid changes to one file may be coalesced downstream, but none are lost.
pub trait FileMonitor: Send + Sync {
    /// Start watching a file for changes
    fn monitor(&self, path: &Path) -> Result<(), MonitorError>;

    /// Stop watching a file
    fn unmonitor(&self, path: &Path) -> Result<(), MonitorError>;

    /// Open a channel that receives the path of every detected change
    fn subscribe(&self) -> Receiver<PathBuf>;
}

/// Production monitor over the platform file watcher
pub struct NotifyMonitor {
    watcher: Mutex<RecommendedWatcher>,
    subscribers: Arc<Mutex<Vec<Sender<PathBuf>>>>,
}

impl NotifyMonitor {
    pub fn new() -> Result<Self, MonitorError> {
        let subscribers: Arc<Mutex<Vec<Sender<PathBuf>>>> = Arc::new(Mutex::new(Vec::new()));
        let fanout = subscribers.clone();

        let watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!("file watcher error: {error}");
                        return;
                    }
                };

                let mut subscribers = lock(&fanout);
                for path in event.paths {
                    subscribers.retain(|sender| sender.send(path.clone()).is_ok());
                }
            },
            Config::default(),
        )?;

        Ok(NotifyMonitor {
            watcher: Mutex::new(watcher),
            subscribers,
        })
    }
}

impl FileMonitor for NotifyMonitor {
    fn monitor(&self, path: &Path) -> Result<(), MonitorError> {
        // a file that does not exist yet cannot be watched directly; watching
        // its parent still surfaces the creation event under the file's path
        let target = if path.exists() {
            path
        } else {
            path.parent().unwrap_or(path)
        };

        lock(&self.watcher)
            .watch(target, RecursiveMode::NonRecursive)
            .map_err(|source| MonitorError::WatchPath {
                path: path.to_path_buf(),
                source,
            })
    }

    fn unmonitor(&self, path: &Path) -> Result<(), MonitorError> {
        lock(&self.watcher)
            .unwatch(path)
            .map_err(|source| MonitorError::WatchPath {
                path: path.to_path_buf(),
                source,
            })
    }

    fn subscribe(&self) -> Receiver<PathBuf> {
        let (sender, receiver) = channel();
        lock(&self.subscribers).push(sender);
        receiver
    }
}

/// In-process monitor for callers that deliver their own change events
///
/// Tracks registrations and forwards whatever `notify_changed` is given;
/// useful when the embedding application already has a change feed, and in
/// tests.
#[derive(Default)]
pub struct ManualMonitor {
    watched: Mutex<HashSet<PathBuf>>,
    subscribers: Mutex<Vec<Sender<PathBuf>>>,
}

impl ManualMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a change event for `path` to all subscribers
    pub fn notify_changed(&self, path: &Path) {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|sender| sender.send(path.to_path_buf()).is_ok());
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        lock(&self.watched).contains(path)
    }
}

impl FileMonitor for ManualMonitor {
    fn monitor(&self, path: &Path) -> Result<(), MonitorError> {
        lock(&self.watched).insert(path.to_path_buf());
        Ok(())
    }

    fn unmonitor(&self, path: &Path) -> Result<(), MonitorError> {
        lock(&self.watched).remove(path);
        Ok(())
    }

    fn subscribe(&self) -> Receiver<PathBuf> {
        let (sender, receiver) = channel();
        lock(&self.subscribers).push(sender);
        receiver
    }
}
