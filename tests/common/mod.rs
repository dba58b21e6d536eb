#![allow(dead_code)]

use assert_fs::TempDir;
use assert_fs::fixture::{FileWriteStr, PathChild};
use std::sync::Arc;
use twig::areas::repository::Repository;
use twig::artifacts::monitor::ManualMonitor;

/// Open an initialized repository backed by a manual monitor, so tests can
/// deliver change events themselves
pub fn init_repository(dir: &TempDir) -> (Repository, Arc<ManualMonitor>) {
    let monitor = Arc::new(ManualMonitor::new());
    let repository = Repository::open_with_monitor(dir.path(), monitor.clone())
        .expect("Failed to open repository");
    repository.init().expect("Failed to initialize repository");

    (repository, monitor)
}

pub fn write_file(dir: &TempDir, relative: &str, content: &str) {
    dir.child(relative)
        .write_str(content)
        .expect("Failed to write fixture file");
}

/// A fixed timestamp so commit bytes are reproducible across runs
pub fn fixed_time() -> chrono::DateTime<chrono::FixedOffset> {
    chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05+01:00")
        .expect("Invalid fixture timestamp")
}
