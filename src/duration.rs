//! Human-readable durations ("55m", "1h") for configuration values.

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{de, Deserialize, Deserializer, Serializer};

const SECS_PER_HOUR: i64 = 60 * 60;
const SECS_PER_MINUTE: i64 = 60;
const MAX_SECS: i64 = 365 * 24 * SECS_PER_HOUR;

/// Parse a duration string like "55m", "1h", "3300s".
///
/// Supported units are `h`, `m` and `s`. The input is case-insensitive and
/// whitespace is trimmed. Durations must be positive and at most a year
/// (`8760h`).
///
/// # Examples
///
/// ```
/// use keyring_gcloud::duration::parse_duration;
/// use chrono::Duration;
///
/// assert_eq!(parse_duration("55m").unwrap(), Duration::minutes(55));
/// assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
/// assert_eq!(parse_duration(" 90S ").unwrap(), Duration::seconds(90));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Duration must not be empty");
    };
    let num = &s[..s.len() - unit.len_utf8()];

    let multiplier = match unit {
        'h' => SECS_PER_HOUR,
        'm' => SECS_PER_MINUTE,
        's' => 1,
        _ => anyhow::bail!("Duration must end with h, m, or s"),
    };

    let num: i64 = num
        .trim()
        .parse()
        .with_context(|| format!("Invalid number in duration {s:?}"))?;
    if num <= 0 {
        anyhow::bail!("Duration must be positive, got {s:?}");
    }

    let secs = num
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_SECS)
        .with_context(|| format!("Duration {s:?} is longer than 8760h"))?;
    Duration::try_seconds(secs).context("Duration is too large")
}

/// Format a duration using the largest unit that divides it evenly.
///
/// ```
/// use keyring_gcloud::duration::format_duration;
/// use chrono::Duration;
///
/// assert_eq!(format_duration(Duration::minutes(55)), "55m");
/// assert_eq!(format_duration(Duration::hours(2)), "2h");
/// assert_eq!(format_duration(Duration::seconds(90)), "90s");
/// ```
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds();
    if secs >= SECS_PER_HOUR && secs % SECS_PER_HOUR == 0 {
        format!("{}h", secs / SECS_PER_HOUR)
    } else if secs >= SECS_PER_MINUTE && secs % SECS_PER_MINUTE == 0 {
        format!("{}m", secs / SECS_PER_MINUTE)
    } else {
        format!("{secs}s")
    }
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Serde serializer producing the same format `deserialize_duration` accepts.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
