//! Unit tests for the Engine logging hub
//!
//! IMPORTANT: LOGGER is a global OnceLock shared across all tests.
//! All tests are marked with #[serial] to run sequentially.

use crate::ember::{Engine, Error, Result};
use crate::ember::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, bool)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((
            entry.severity,
            entry.message.clone(),
            entry.file.is_some(),
        ));
    }
}

fn capture() -> Arc<Mutex<Vec<(LogSeverity, String, bool)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

// ============================================================================
// LOGGER TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_logger_receives_entries() {
    let entries = capture();
    Engine::log(LogSeverity::Info, "ember::test", "hello".to_string());
    Engine::log_detailed(LogSeverity::Error, "ember::test", "boom".to_string(), "x.rs", 3);
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], (LogSeverity::Info, "hello".to_string(), false));
    assert_eq!(entries[1], (LogSeverity::Error, "boom".to_string(), true));
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let entries = capture();
    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "ember::test", "not captured".to_string());
    assert!(entries.lock().unwrap().is_empty());
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_critical_macro_is_detailed() {
    let entries = capture();
    crate::engine_critical!("ember::test", "limitation {}", 7);
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries[0], (LogSeverity::Critical, "limitation 7".to_string(), true));
}

#[test]
#[serial]
fn test_engine_bail_logs_and_returns_backend_error() {
    fn failing() -> Result<()> {
        crate::engine_bail!("ember::test", "failed with code {}", -4);
    }

    let entries = capture();
    let result = failing();
    Engine::reset_logger();

    assert_eq!(result, Err(Error::BackendError("failed with code -4".to_string())));
    assert_eq!(entries.lock().unwrap()[0].0, LogSeverity::Error);
}

#[test]
#[serial]
fn test_engine_bail_warn_logs_at_warn() {
    fn failing() -> Result<()> {
        crate::engine_bail_warn!("ember::test", "soft failure");
    }

    let entries = capture();
    assert!(failing().is_err());
    Engine::reset_logger();

    assert_eq!(entries.lock().unwrap()[0].0, LogSeverity::Warn);
}

#[test]
#[serial]
fn test_engine_contract_returns_contract_violation() {
    fn failing() -> Result<()> {
        crate::engine_contract!("ember::test", "dangling ref {}", 2);
    }

    let entries = capture();
    let result = failing();
    Engine::reset_logger();

    assert_eq!(result, Err(Error::ContractViolation("dangling ref 2".to_string())));
    assert_eq!(entries.lock().unwrap().len(), 1);
}
