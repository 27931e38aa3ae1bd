use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use derive_more::{AsRef, Debug, Display};
use serde::{Deserialize, Serialize};

/// ISO-8601 instant on the local clock.
///
/// Kept as text rather than a parsed `DateTime` so that logs written by other
/// tools (for example with offset-less timestamps) still load.
#[derive(Debug, Display, AsRef, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn now() -> Self {
        Local::now().into()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp
where
    Tz::Offset: std::fmt::Display,
{
    fn from(value: DateTime<Tz>) -> Self {
        Self(value.to_rfc3339_opts(SecondsFormat::Micros, false))
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("timestamp must not be empty".into());
        }
        Ok(Self(s.into()))
    }
}
