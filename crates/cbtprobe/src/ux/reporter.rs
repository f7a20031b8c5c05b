use cbtprobe_core::report::{Event, Reporter, Severity};
use chrono::Local;
use console::Term;

use super::presenter::{format_log_line, format_request, format_response, rule};

/// Renders driver events as timestamped console lines.
///
/// Quiet mode keeps only success and error lines; request and response
/// echoes are shown in verbose mode only, and responses with a 5xx status
/// are never echoed.
#[derive(Debug)]
pub struct ConsoleReporter {
    term: Term,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            term: Term::stdout(),
            verbose,
        }
    }

    /// Lines to print for `event`, empty when it is filtered out.
    pub fn render(&self, event: &Event, timestamp: &str) -> Vec<String> {
        match event {
            Event::Log { severity, message } => {
                if self.verbose || matches!(severity, Severity::Success | Severity::Error) {
                    vec![format_log_line(timestamp, *severity, message)]
                } else {
                    vec![]
                }
            }
            Event::Section { title, major } if self.verbose => {
                let rule = rule(*major);
                vec![
                    String::new(),
                    format_log_line(timestamp, Severity::Info, &rule),
                    format_log_line(timestamp, Severity::Info, title),
                    format_log_line(timestamp, Severity::Info, &rule),
                ]
            }
            Event::Request { method, path, body } if self.verbose => {
                format_request(method, path, body.as_ref())
            }
            Event::Response { status, body } if self.verbose && *status < 500 => {
                format_response(*status, body)
            }
            _ => vec![],
        }
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&self, event: &Event) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        for line in self.render(event, &timestamp) {
            // A closed stdout must not stop the run
            let _ = self.term.write_line(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TS: &str = "2024-05-01 09:30:00";

    fn log(severity: Severity, message: &str) -> Event {
        Event::Log {
            severity,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_quiet_keeps_successes_and_errors() {
        console::set_colors_enabled(false);
        let reporter = ConsoleReporter::new(false);

        assert_eq!(
            reporter.render(&log(Severity::Success, "Exam started"), TS),
            vec!["[2024-05-01 09:30:00] ✅ Exam started"]
        );
        assert_eq!(reporter.render(&log(Severity::Error, "boom"), TS).len(), 1);
        assert!(reporter.render(&log(Severity::Warning, "skip"), TS).is_empty());
        assert!(reporter.render(&log(Severity::Info, "note"), TS).is_empty());

        let section = Event::Section {
            title: "TEST SUMMARY".to_string(),
            major: true,
        };
        assert!(reporter.render(&section, TS).is_empty());
        let request = Event::Request {
            method: "GET".to_string(),
            path: "/student/results".to_string(),
            body: None,
        };
        assert!(reporter.render(&request, TS).is_empty());
    }

    #[test]
    fn test_verbose_section_and_echo() {
        console::set_colors_enabled(false);
        let reporter = ConsoleReporter::new(true);

        let section = Event::Section {
            title: "TESTING ADMIN - BULK IMPORT".to_string(),
            major: true,
        };
        let lines = reporter.render(&section, TS);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], format!("[{TS}] ℹ️ {}", "=".repeat(60)));
        assert_eq!(lines[2], format!("[{TS}] ℹ️ TESTING ADMIN - BULK IMPORT"));

        let minor = Event::Section {
            title: "TESTING ADMIN - QUESTION MANAGEMENT".to_string(),
            major: false,
        };
        assert!(reporter.render(&minor, TS)[1].ends_with(&"-".repeat(60)));

        let ok = Event::Response {
            status: 200,
            body: json!({"ok": true}),
        };
        assert_eq!(reporter.render(&ok, TS)[0], "📥 Status: 200");
        let failed = Event::Response {
            status: 500,
            body: json!({"error": "Internal server error"}),
        };
        assert!(reporter.render(&failed, TS).is_empty());
    }
}
