use super::*;
use serial_test::serial;
use std::sync::{Arc, Mutex};
use crate::{nebula_debug, nebula_error, nebula_info};

/// Test logger that records every entry it receives.
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(Box::new(CaptureLogger {
        entries: Arc::clone(&entries),
    }));
    entries
}

fn captured(entries: &Arc<Mutex<Vec<LogEntry>>>) -> Vec<LogEntry> {
    entries.lock().map(|guard| guard.to_vec()).unwrap_or_default()
}

// ============================================================================
// Macro dispatch
// ============================================================================

#[test]
#[serial]
fn test_macros_dispatch_to_installed_logger() {
    let entries = install_capture();

    nebula_info!("nebula::test", "hello {}", 42);
    nebula_debug!("nebula::test", "state dump");

    let logged = captured(&entries);
    set_logger(Box::new(DefaultLogger));

    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].severity, LogSeverity::Info);
    assert_eq!(logged[0].source, "nebula::test");
    assert_eq!(logged[0].message, "hello 42");
    assert_eq!(logged[1].severity, LogSeverity::Debug);
}

#[test]
#[serial]
fn test_error_macro_carries_file_and_line() {
    let entries = install_capture();

    nebula_error!("nebula::test", "boom: {}", "reason");

    let logged = captured(&entries);
    set_logger(Box::new(DefaultLogger));

    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].severity, LogSeverity::Error);
    assert_eq!(logged[0].message, "boom: reason");
    assert!(logged[0].file.is_some());
    assert!(logged[0].line.is_some());
}

#[test]
#[serial]
fn test_set_logger_replaces_previous() {
    let first = install_capture();
    nebula_info!("nebula::test", "to first");

    let second = install_capture();
    nebula_info!("nebula::test", "to second");

    let first_logged = captured(&first);
    let second_logged = captured(&second);
    set_logger(Box::new(DefaultLogger));

    assert_eq!(first_logged.len(), 1);
    assert_eq!(second_logged.len(), 1);
    assert_eq!(second_logged[0].message, "to second");
}

// ============================================================================
// Severity levels
// ============================================================================

#[test]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}
