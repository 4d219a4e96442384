// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Speed anomaly detection

use super::{check_snapshot, Alert, AlertKind, DetectionContext, Detector, DetectorError, Severity};

/// Above this is critical (km/h)
pub const EXTREME_SPEED_KMH: f64 = 140.0;

/// Above this is high (km/h)
pub const HIGH_SPEED_KMH: f64 = 120.0;

/// Flags vehicles travelling well above the limit
pub struct SpeedDetector;

impl Detector for SpeedDetector {
    fn name(&self) -> &'static str {
        "speed"
    }

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError> {
        let mut alerts = Vec::new();

        for snapshot in ctx.snapshots {
            check_snapshot(snapshot)?;
            let subject = ctx.vehicle(snapshot);
            let speed = snapshot.speed;

            if speed > EXTREME_SPEED_KMH {
                alerts.push(ctx.alert(
                    subject,
                    AlertKind::ExtremeSpeed,
                    Severity::Critical,
                    format!("⚠️ {} traveling at {:.0} km/h — dangerously above limit", subject.name, speed),
                ));
            } else if speed > HIGH_SPEED_KMH {
                alerts.push(ctx.alert(
                    subject,
                    AlertKind::HighSpeed,
                    Severity::High,
                    format!("🚨 {} at {:.0} km/h — significantly above speed limit", subject.name, speed),
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

    fn run(speed: f64) -> Vec<Alert> {
        let snapshots = vec![Snapshot::new("b1").with_speed(speed).driving(true)];
        let devices = devices(&["b1"]);
        SpeedDetector
            .evaluate(&DetectionContext::new(&snapshots, &devices, daytime()))
            .unwrap()
    }

    #[test]
    fn test_extreme_speed_is_critical() {
        let alerts = run(141.0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertKind::ExtremeSpeed);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].vehicle_name, "Car b1");
    }

    #[test]
    fn test_high_speed_is_high() {
        let alerts = run(125.0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertKind::HighSpeed);
        assert_eq!(alerts[0].severity, Severity::High);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        assert!(run(100.0).is_empty());
        assert!(run(120.0).is_empty());
        assert_eq!(run(140.0)[0].alert_type, AlertKind::HighSpeed);
    }

    #[test]
    fn test_unnamed_vehicle_is_unknown() {
        let snapshots = vec![Snapshot::new("ghost").with_speed(150.0)];
        let devices = devices(&[]);
        let alerts = SpeedDetector
            .evaluate(&DetectionContext::new(&snapshots, &devices, daytime()))
            .unwrap();
        assert_eq!(alerts[0].vehicle_name, "Unknown");
    }

    #[test]
    fn test_non_finite_speed_fails_detector() {
        let snapshots = vec![Snapshot::new("b1").with_speed(f64::NAN)];
        let devices = devices(&["b1"]);
        let result = SpeedDetector.evaluate(&DetectionContext::new(&snapshots, &devices, daytime()));
        assert!(matches!(result, Err(DetectorError::InvalidSnapshot { .. })));
    }
}
