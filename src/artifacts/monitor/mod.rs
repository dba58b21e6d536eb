//! File change monitoring
//!
//! - `file_monitor`: the external-notification collaborator — a trait plus a
//!   native implementation over the `notify` watcher and an in-process one for
//!   embedders that deliver their own change events
//! - `monitored_file_map`: a generic file-keyed cache invalidated by monitor
//!   notifications, with a size+mtime snapshot as a staleness backstop

pub mod file_monitor;
pub mod monitored_file_map;

pub use file_monitor::{FileMonitor, ManualMonitor, MonitorError, NotifyMonitor};
pub use monitored_file_map::MonitoredFileMap;
