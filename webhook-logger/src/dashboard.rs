use std::fmt::Write;

use crate::models::DeliveryRecord;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Webhook Logger</title>
    <style>
        body { font-family: 'Courier New', monospace; padding: 20px; background-color: #1e1e1e; color: #00ff00; }
        h1 { border-bottom: 2px solid #00ff00; padding-bottom: 10px; }
        .log-entry { border: 1px solid #00ff00; padding: 15px; margin: 10px 0; border-radius: 5px; background-color: #2d2d2d; }
        .timestamp { color: #ffff00; font-weight: bold; }
        .empty { color: #ffff00; }
        pre { background-color: #000; padding: 10px; border-radius: 3px; overflow-x: auto; }
    </style>
</head>
<body>
"#;

/// HTML page listing `records` in the order given.
pub fn render(port: u16, records: &[DeliveryRecord]) -> String {
    let mut html = String::from(HEAD);
    let _ = writeln!(html, "    <h1>Webhook Logger</h1>");
    let _ = writeln!(
        html,
        "    <p>Listening for webhook requests on port <strong>{port}</strong></p>"
    );
    let _ = writeln!(html, "    <h2>Recent Webhook Events</h2>");

    if records.is_empty() {
        let _ = writeln!(html, r#"    <p class="empty">No webhook events received yet.</p>"#);
    }
    for record in records {
        let _ = write!(
            html,
            r#"    <div class="log-entry">
        <div class="timestamp">{}</div>
        <div><strong>Method:</strong> {}</div>
        <div><strong>Path:</strong> {}</div>
        <div><strong>Content-Type:</strong> {}</div>
        <div><strong>Body:</strong></div>
        <pre>{}</pre>
    </div>
"#,
            escape(record.timestamp.as_str()),
            escape(&record.method),
            escape(&record.path),
            escape(&record.content_type),
            escape(&record.pretty_body()),
        );
    }

    let _ = write!(
        html,
        r#"    <h2>Instructions</h2>
    <ul>
        <li>Point a webhook endpoint in the issue tracker at <strong>http://localhost:{port}</strong> (any path)</li>
        <li>Trigger an event (create or update an issue, log time, ...)</li>
        <li>Reload this page to see the latest deliveries</li>
        <li>Check the console output for full headers and bodies</li>
    </ul>
</body>
</html>
"#
    );
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
