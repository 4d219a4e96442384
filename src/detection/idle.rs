// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Excessive idling detection

use super::{check_snapshot, Alert, AlertKind, DetectionContext, Detector, DetectorError, Severity};

/// Idle longer than this is medium severity (minutes)
pub const EXCESSIVE_IDLE_MINUTES: i64 = 120;

/// Idle longer than this is low severity (minutes)
pub const LONG_IDLE_MINUTES: i64 = 60;

/// Flags stopped vehicles that have sat in place too long.
///
/// Only stationary, non-driving vehicles with a known state duration are
/// considered; an unknown duration is skipped rather than alerted.
pub struct IdleDetector;

impl Detector for IdleDetector {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError> {
        let mut alerts = Vec::new();

        for snapshot in ctx.snapshots {
            check_snapshot(snapshot)?;
            if snapshot.is_driving || snapshot.speed != 0.0 {
                continue;
            }
            let Some(duration) = snapshot.current_state_duration else {
                continue;
            };

            let subject = ctx.vehicle(snapshot);
            let minutes = duration.num_minutes();

            if minutes > EXCESSIVE_IDLE_MINUTES {
                alerts.push(ctx.alert(
                    subject,
                    AlertKind::ExcessiveIdle,
                    Severity::Medium,
                    format!("🟡 {} idle for {} min — extended idle detected", subject.name, minutes),
                ));
            } else if minutes > LONG_IDLE_MINUTES {
                alerts.push(ctx.alert(
                    subject,
                    AlertKind::LongIdle,
                    Severity::Low,
                    format!("💤 {} idle for {} min at current location", subject.name, minutes),
                ));
            }
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::telemetry::Snapshot;
    use chrono::Duration;

    fn run(snapshot: Snapshot) -> Vec<Alert> {
        let snapshots = vec![snapshot];
        let devices = devices(&["b1"]);
        IdleDetector
            .evaluate(&DetectionContext::new(&snapshots, &devices, daytime()))
            .unwrap()
    }

    fn parked_for(minutes: i64) -> Snapshot {
        Snapshot::new("b1").in_state_for(Duration::minutes(minutes))
    }

    #[test]
    fn test_excessive_idle() {
        let alerts = run(parked_for(150));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertKind::ExcessiveIdle);
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert!(alerts[0].message.contains("150 min"));
    }

    #[test]
    fn test_long_idle() {
        let alerts = run(parked_for(90));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertKind::LongIdle);
        assert_eq!(alerts[0].severity, Severity::Low);
    }

    #[test]
    fn test_short_idle_is_quiet() {
        assert!(run(parked_for(30)).is_empty());
        assert!(run(parked_for(60)).is_empty());
        assert_eq!(run(parked_for(120))[0].alert_type, AlertKind::LongIdle);
    }

    #[test]
    fn test_unknown_duration_is_skipped() {
        assert!(run(Snapshot::new("b1")).is_empty());
    }

    #[test]
    fn test_moving_vehicles_are_not_idle() {
        assert!(run(parked_for(300).driving(true)).is_empty());
        assert!(run(parked_for(300).with_speed(3.0)).is_empty());
    }
}
