use cbtprobe_core::RunSummary;
use cbtprobe_core::report::Severity;
use console::{Style, StyledObject};
use serde_json::Value;

const RULE_WIDTH: usize = 60;
const PREVIEW_CHARS: usize = 200;

pub fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "❌",
        Severity::Success => "✅",
        Severity::Warning => "⚠️",
        Severity::Info => "ℹ️",
    }
}

pub fn style_message(text: &str, severity: Severity) -> StyledObject<&str> {
    let style_obj = match severity {
        Severity::Error => Style::new().red().bold(),
        Severity::Success => Style::new().green(),
        Severity::Warning => Style::new().yellow(),
        Severity::Info => Style::new(),
    };
    style_obj.apply_to(text)
}

/// `[2024-05-01 09:30:00] ✅ Class created: C1`
pub fn format_log_line(timestamp: &str, severity: Severity, message: &str) -> String {
    format!(
        "[{timestamp}] {} {}",
        marker(severity),
        style_message(message, severity)
    )
}

pub fn rule(major: bool) -> String {
    let c = if major { "=" } else { "-" };
    c.repeat(RULE_WIDTH)
}

/// Pretty JSON cut to the first 200 characters.
pub fn preview_json(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    pretty.chars().take(PREVIEW_CHARS).collect()
}

pub fn format_request(method: &str, path: &str, body: Option<&Value>) -> Vec<String> {
    let mut lines = vec![String::new(), format!("📤 {method} {path}")];
    if let Some(body) = body.filter(|b| !is_empty_json(b)) {
        lines.push(format!("   Data: {}...", preview_json(body)));
    }
    lines
}

pub fn format_response(status: u16, body: &Value) -> Vec<String> {
    let mut lines = vec![format!("📥 Status: {status}")];
    if !is_empty_json(body) {
        lines.push(format!("   Response: {}...", preview_json(body)));
    }
    lines
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(o) => o.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn token_flag(acquired: bool) -> &'static str {
    if acquired { "✅" } else { "❌" }
}

pub fn format_summary(summary: &RunSummary) -> String {
    let mut text = format!(
        "
Resources Created:
  - Classes: {}
  - Subjects: {}
  - Assessments: {}
  - Students: {}
  - Class-subject links: {}

Tokens Acquired:
  - Admin: {}
  - Student: {}

API Base URL: {}
",
        summary.classes,
        summary.subjects,
        summary.assessments,
        summary.students,
        summary.class_subjects,
        token_flag(summary.admin_token),
        token_flag(summary.student_token),
        summary.base_url,
    );
    if let Some(reason) = &summary.aborted {
        text.push_str(&format!("Run stopped early: {reason}\n"));
    }
    text
}

pub fn banner() -> &'static str {
    "
    ╔══════════════════════════════════════════════════════════════╗
    ║          StudentCBT API Testing Suite                        ║
    ║  Comprehensive API tests for Admin and Student roles         ║
    ╚══════════════════════════════════════════════════════════════╝
"
}
