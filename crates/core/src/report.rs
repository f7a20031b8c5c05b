//! Progress events emitted by the driver.
//!
//! The core never writes to the terminal. Front ends implement [`Reporter`]
//! to render events; every event is also forwarded to `tracing`.
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Log {
        severity: Severity,
        message: String,
    },
    /// Heading for a scenario. `major` headings open a top-level scenario.
    Section { title: String, major: bool },
    Request {
        method: String,
        path: String,
        body: Option<Value>,
    },
    Response { status: u16, body: Value },
}

pub trait Reporter: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Forwards an event to the reporter and mirrors it into the tracing log.
pub(crate) fn dispatch(reporter: &dyn Reporter, event: Event) {
    match &event {
        Event::Log { severity, message } => match severity {
            Severity::Error => tracing::error!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Success | Severity::Info => tracing::info!("{message}"),
        },
        Event::Section { title, .. } => tracing::info!("== {title}"),
        Event::Request { method, path, body } => {
            tracing::debug!(%method, %path, body = ?body, "request")
        }
        Event::Response { status, body } => tracing::debug!(status, body = %body, "response"),
    }
    reporter.emit(&event);
}
