//! Proto-JSON duration encoding.
//!
//! Durations in emitted config use the protobuf JSON mapping: a decimal
//! number of seconds with an `s` suffix (`"5s"`, `"0.5s"`).

use std::time::Duration;

use serde::de::{self, Deserialize, Deserializer};
use serde::Serializer;

/// Format a duration as a proto-JSON string.
#[must_use]
pub fn format(d: &Duration) -> String {
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        format!("{}s", d.as_secs())
    } else {
        let frac = format!("{:09}", nanos);
        format!("{}.{}s", d.as_secs(), frac.trim_end_matches('0'))
    }
}

/// Parse a proto-JSON duration string.
pub fn parse(s: &str) -> Result<Duration, String> {
    let body = s
        .strip_suffix('s')
        .ok_or_else(|| format!("duration missing 's' suffix: {s}"))?;
    let value: f64 = body
        .parse()
        .map_err(|_| format!("invalid duration: {s}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration: {s}"));
    }
    Ok(Duration::from_secs_f64(value))
}

/// Serialize a [`Duration`] via [`format`].
pub fn serialize<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(d))
}

/// Deserialize a [`Duration`] via [`parse`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(de::Error::custom)
}
