//! Telemetry module - fleet roster and live status sources

mod traits;
mod geotab;
mod simulator;

pub use traits::{DeviceInfo, DeviceMap, Snapshot, SnapshotProvider, UNKNOWN_VEHICLE_NAME};
pub use geotab::GeotabProvider;
pub use simulator::DemoFleetProvider;

use chrono::Duration;
use thiserror::Error;

/// Failures talking to a telemetry source. Fatal to one monitor cycle only.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telemetry API error: {message}")]
    Api { message: String },

    #[error("telemetry authentication failed: {0}")]
    Auth(String),

    #[error("could not decode telemetry response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("telemetry source not configured: {0}")]
    NotConfigured(String),
}

/// Parse a state duration in `[d.]HH:MM:SS[.fffffff]` form.
///
/// Returns `None` for anything that does not fit; callers treat that as
/// "duration unknown".
pub fn parse_state_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (days, clock) = match raw.split_once('.') {
        // "1.02:03:04" has the day separator before the first colon
        Some((head, rest)) if !head.contains(':') => (head.parse::<i64>().ok()?, rest),
        _ => (0, raw),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds = match parts.next() {
        Some(s) => s.split('.').next()?.parse::<i64>().ok()?,
        None => 0,
    };
    if parts.next().is_some() || days < 0 || hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }

    Some(Duration::days(days) + Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_clock() {
        assert_eq!(parse_state_duration("01:30:00"), Some(Duration::minutes(90)));
        assert_eq!(parse_state_duration("00:00:45"), Some(Duration::seconds(45)));
    }

    #[test]
    fn test_parse_fraction_and_days() {
        assert_eq!(
            parse_state_duration("02:31:10.5230000"),
            Some(Duration::hours(2) + Duration::minutes(31) + Duration::seconds(10))
        );
        assert_eq!(
            parse_state_duration("1.02:00:00"),
            Some(Duration::hours(26))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_state_duration(""), None);
        assert_eq!(parse_state_duration("soon"), None);
        assert_eq!(parse_state_duration("10:75:00"), None);
        assert_eq!(parse_state_duration("1:2:3:4"), None);
    }
}
