use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method, Uri, header};
use serde::{Deserialize, Deserializer, Serialize};

use crate::invariants::Timestamp;

/// One inbound request, as it is written to the log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub timestamp: Timestamp,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, deserialize_with = "lenient_length")]
    pub content_length: u64,
}

impl DeliveryRecord {
    /// Repeated header names collapse to the last value seen.
    pub fn from_request(
        timestamp: Timestamp,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        let content_type = header_text(headers, header::CONTENT_TYPE).unwrap_or_default();
        let content_length = header_text(headers, header::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self {
            timestamp,
            method: method.as_str().to_owned(),
            path: uri.to_string(),
            headers,
            body: String::from_utf8_lossy(body).into_owned(),
            content_type,
            content_length,
        }
    }

    /// The body re-indented when it is JSON, otherwise the raw text.
    pub fn pretty_body(&self) -> String {
        pretty_json(&self.body).unwrap_or_else(|| self.body.clone())
    }
}

pub fn pretty_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get_all(name)
        .iter()
        .last()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

// Other tools store the raw header text here; accept both shapes.
fn lenient_length<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Length {
        Number(u64),
        Text(String),
    }
    Ok(match Length::deserialize(deserializer)? {
        Length::Number(n) => n,
        Length::Text(text) => text.trim().parse().unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asserting::prelude::*;
    use axum::http::HeaderValue;

    fn ts() -> Timestamp {
        "2026-10-19T10:00:00.000000+00:00".parse().unwrap()
    }

    #[test]
    fn json_delivery_is_captured_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("11"));
        let uri: Uri = "/hook".parse().unwrap();

        let record =
            DeliveryRecord::from_request(ts(), &Method::POST, &uri, &headers, br#"{"issue":1}"#);

        assert_eq!(record.method, "POST");
        assert_eq!(record.path, "/hook");
        assert_eq!(record.content_type, "application/json");
        assert_eq!(record.content_length, 11);
        assert_eq!(record.body, r#"{"issue":1}"#);
        assert_that!(record.headers.len()).is_equal_to(2);
    }

    #[test]
    fn query_string_is_kept_in_path() {
        let uri: Uri = "/hooks/redmine?project=alpha&debug".parse().unwrap();
        let record = DeliveryRecord::from_request(ts(), &Method::POST, &uri, &HeaderMap::new(), b"");
        assert_eq!(record.path, "/hooks/redmine?project=alpha&debug");
    }

    #[test]
    fn missing_headers_default() {
        let uri: Uri = "/".parse().unwrap();
        let record = DeliveryRecord::from_request(ts(), &Method::POST, &uri, &HeaderMap::new(), b"");
        assert_eq!(record.content_type, "");
        assert_eq!(record.content_length, 0);
        assert_that!(record.headers.is_empty()).is_true();
    }

    #[test]
    fn malformed_content_length_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("lots"));
        let uri: Uri = "/".parse().unwrap();
        let record = DeliveryRecord::from_request(ts(), &Method::POST, &uri, &headers, b"abc");
        assert_eq!(record.content_length, 0);
        assert_eq!(record.body, "abc");
    }

    #[test]
    fn duplicate_headers_keep_last_value() {
        let mut headers = HeaderMap::new();
        headers.append("x-redmine-event", HeaderValue::from_static("issue.created"));
        headers.append("x-redmine-event", HeaderValue::from_static("issue.updated"));
        let uri: Uri = "/".parse().unwrap();
        let record = DeliveryRecord::from_request(ts(), &Method::POST, &uri, &headers, b"");
        assert_eq!(
            record.headers.get("x-redmine-event").map(String::as_str),
            Some("issue.updated")
        );
    }

    #[test]
    fn invalid_utf8_body_is_replaced_not_rejected() {
        let uri: Uri = "/".parse().unwrap();
        let record = DeliveryRecord::from_request(
            ts(),
            &Method::POST,
            &uri,
            &HeaderMap::new(),
            &[b'o', b'k', 0xff, 0xfe],
        );
        assert_eq!(record.body, "ok\u{fffd}\u{fffd}");
    }

    #[test]
    fn pretty_body_indents_json_and_passes_text_through() {
        let mut record = DeliveryRecord::from_request(
            ts(),
            &Method::POST,
            &"/".parse().unwrap(),
            &HeaderMap::new(),
            br#"{"issue":{"id":7}}"#,
        );
        assert_eq!(record.pretty_body(), "{\n  \"issue\": {\n    \"id\": 7\n  }\n}");

        record.body = "plain text, not json".into();
        assert_eq!(record.pretty_body(), "plain text, not json");
    }

    #[test]
    fn content_length_loads_from_text_or_number() {
        let from_text: DeliveryRecord = serde_json::from_str(
            r#"{"timestamp":"2025-01-01T12:00:00.123456","method":"POST","path":"/",
                "headers":{},"body":"","content_type":"","content_length":"42"}"#,
        )
        .unwrap();
        assert_eq!(from_text.content_length, 42);

        let minimal: DeliveryRecord = serde_json::from_str(
            r#"{"timestamp":"t","method":"POST","path":"/","body":"x","content_length":0}"#,
        )
        .unwrap();
        assert_eq!(minimal.content_length, 0);
        assert_that!(minimal.headers.is_empty()).is_true();
    }
}
