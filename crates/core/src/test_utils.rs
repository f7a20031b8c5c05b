//! Test utilities for cbtprobe-core
//!
//! Helpers shared by unit tests and the integration tests under `tests/`.

use std::sync::{Arc, Mutex};

use crate::config::ProbeConfig;
use crate::report::{Event, Reporter, Severity};

/// A reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CaptureReporter {
    events: Mutex<Vec<Event>>,
}

impl CaptureReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages of all log events with the given severity, in emission order.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Log {
                    severity: s,
                    message,
                } if s == severity => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn has_message(&self, severity: Severity, needle: &str) -> bool {
        self.messages(severity).iter().any(|m| m.contains(needle))
    }
}

impl Reporter for CaptureReporter {
    fn emit(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Default configuration pointed at `base_url` (usually a mock server).
///
/// # Panics
/// Panics if the embedded default configuration is invalid.
pub fn config_for(base_url: &str) -> ProbeConfig {
    let mut config = ProbeConfig::defaults().unwrap();
    config.base_url = base_url.trim_end_matches('/').to_string();
    config.timeout_secs = 2;
    config
}

/// Base URL of a local port nothing listens on.
///
/// # Panics
/// Panics if no local port can be bound.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
