use std::{fmt::Write, path::Path};

use num_format::{Locale, ToFormattedString};

use crate::models::DeliveryRecord;

const RULE: &str = "============================================================";

/// What happened when a delivery was written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { total: usize },
    Failed(String),
}

/// Human-readable console block for one delivery.
pub fn render(
    record: &DeliveryRecord,
    body_bytes: usize,
    log_file: &Path,
    outcome: &SaveOutcome,
) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "WEBHOOK RECEIVED - {}", record.timestamp);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Method:   {}", record.method);
    let _ = writeln!(out, "Path:     {}", record.path);
    let _ = writeln!(out, "Headers:");
    for (name, value) in &record.headers {
        let _ = writeln!(out, "  {name}: {value}");
    }
    let _ = writeln!(
        out,
        "\nBody ({} bytes):",
        body_bytes.to_formatted_string(&Locale::en)
    );
    let _ = writeln!(out, "{}", record.pretty_body());
    match outcome {
        SaveOutcome::Saved { total } => {
            let _ = writeln!(
                out,
                "\nSaved to: {} ({} deliveries)",
                log_file.display(),
                total.to_formatted_string(&Locale::en)
            );
        }
        SaveOutcome::Failed(reason) => {
            let _ = writeln!(out, "\nFailed to save log: {reason}");
        }
    }
    out.push_str(RULE);
    out
}

pub fn banner(port: u16, log_file: &Path) -> String {
    let log_file = std::path::absolute(log_file).unwrap_or_else(|_| log_file.to_path_buf());
    format!(
        "
{RULE}
WEBHOOK LOGGER
{RULE}

  Port:         {port}
  Health check: http://localhost:{port}/health
  Dashboard:    http://localhost:{port}/
  Log file:     {}

{RULE}
Waiting for webhook requests...
Press Ctrl+C to stop.
{RULE}",
        log_file.display()
    )
}
