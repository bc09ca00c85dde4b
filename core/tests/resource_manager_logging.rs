//! Verifies the diagnostics the resource manager emits.
//!
//! The `log` facade allows a single global logger per process, so this test
//! binary installs a capturing logger and filters by message content.

use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};
use squared_core::{HashedStr, ResourceManager, ResourceManagerError};

struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

fn logger() -> &'static CapturingLogger {
    static LOGGER: OnceLock<&'static CapturingLogger> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger {
            records: Mutex::new(Vec::new()),
        }));
        let _ = log::set_logger(logger);
        log::set_max_level(LevelFilter::Trace);
        logger
    })
}

fn messages_containing(needle: &str) -> Vec<(Level, String)> {
    logger()
        .records
        .lock()
        .map(|records| {
            records
                .iter()
                .filter(|(_, message)| message.contains(needle))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Overwrite with warning
// ---------------------------------------------------------------------------

#[test]
fn duplicate_add_warns_and_overwrites() {
    logger();
    let mut manager = ResourceManager::new();
    manager.add("dup_key_for_warning", 1);
    manager.add("dup_key_for_warning", 2);

    assert_eq!(manager.get("dup_key_for_warning"), Ok(&2));
    let warnings = messages_containing("dup_key_for_warning already exists");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, Level::Warn);
}

#[test]
fn hash_collision_warns_with_both_names() {
    logger();
    let mut manager = ResourceManager::new();
    manager.add(HashedStr::new("declinate"), "first");
    manager.add(HashedStr::new("macallums"), "second");

    assert_eq!(manager.len(), 1);
    assert_eq!(manager.get("declinate"), Ok(&"second"));
    let warnings = messages_containing("macallums collides with declinate");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, Level::Warn);
}

// ---------------------------------------------------------------------------
// Lookup failures
// ---------------------------------------------------------------------------

#[test]
fn missing_lookup_logs_error() {
    logger();
    let manager = ResourceManager::<u8>::new();
    let err = manager.get("missing_key_for_error").unwrap_err();
    assert_eq!(
        err,
        ResourceManagerError::NotFound("missing_key_for_error".into())
    );
    assert_eq!(
        err.to_string(),
        "Resource with id missing_key_for_error not found."
    );

    let errors = messages_containing("missing_key_for_error not found");
    assert!(errors.iter().any(|(level, _)| *level == Level::Error));
}

#[test]
fn optional_lookup_stays_quiet() {
    logger();
    let mut manager = ResourceManager::<u8>::new();
    assert!(manager.try_get("quiet_missing_key").is_none());
    assert!(manager.try_get_mut("quiet_missing_key").is_none());
    manager.add("quiet_present_key", 3);
    assert_eq!(manager.try_get("quiet_present_key"), Some(&3));

    assert!(messages_containing("quiet_missing_key").is_empty());
}
