//! Shared helpers for unit tests.

use std::sync::{Mutex, MutexGuard, OnceLock};

use logtest::Logger;

/// Exclusive access to the process-wide log capture, emptied of earlier records.
pub(crate) fn logger() -> MutexGuard<'static, Logger> {
    static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

    let logger = LOGGER.get_or_init(|| {
        let logger = Logger::start();
        log::set_max_level(log::LevelFilter::Trace);
        Mutex::new(logger)
    });
    let mut guard = logger.lock().unwrap_or_else(|e| e.into_inner());
    while guard.pop().is_some() {}
    guard
}

/// Drain captured records, keeping the messages logged at warn level.
pub(crate) fn warnings(logger: &mut Logger) -> Vec<String> {
    let mut found = Vec::new();
    while let Some(record) = logger.pop() {
        if record.level() == log::Level::Warn {
            found.push(record.args().to_string());
        }
    }
    found
}
