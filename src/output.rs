// ABOUTME: Output formatting for CLI results.
// ABOUTME: Supports JSON (default, for automation) and plain text modes.

use crate::manage::Report;
use serde::Serialize;
use serde_json::Value;

/// Output mode for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON object per run
    #[default]
    Json,
    /// `key: value` lines for humans
    Text,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print the result of a successful run on stdout.
    pub fn result(&self, report: &Report) {
        println!("{}", self.render_result(report));
    }

    /// Print a failure on stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render_error(message));
    }

    pub fn render_result(&self, report: &Report) -> String {
        match self.mode {
            OutputMode::Json => serde_json::to_string(report)
                .unwrap_or_else(|e| self.render_error(&e.to_string())),
            OutputMode::Text => match serde_json::to_value(report) {
                Ok(Value::Object(fields)) => fields
                    .iter()
                    .map(|(key, value)| match value {
                        Value::String(s) => format!("{key}: {s}"),
                        other => format!("{key}: {other}"),
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                _ => format!("changed: {}", report.changed),
            },
        }
    }

    pub fn render_error(&self, message: &str) -> String {
        match self.mode {
            OutputMode::Json => {
                let event = Failure { failed: true, msg: message };
                serde_json::to_string(&event)
                    .unwrap_or_else(|_| format!("Error: {message}"))
            }
            OutputMode::Text => format!("Error: {message}"),
        }
    }
}

#[derive(Serialize)]
struct Failure<'a> {
    failed: bool,
    msg: &'a str,
}
