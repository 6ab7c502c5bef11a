// SPDX-License-Identifier: Apache-2.0

//! Test-only helpers.

use std::sync::{Mutex, Once};

use log::{LevelFilter, Log, Metadata, Record};

static INIT: Once = Once::new();
static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Keeps every enabled record in memory so tests can assert on it.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("charscan")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut captured) = CAPTURED.lock() {
            captured.push(format!("{} {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Installs the capturing logger once per test binary.
pub fn config_test_logger() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Every message captured so far, across all tests of the binary.
pub fn captured_messages() -> Vec<String> {
    CAPTURED.lock().map(|c| c.clone()).unwrap_or_default()
}

/// Encodes `s` as UTF-16 code units.
pub fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}
