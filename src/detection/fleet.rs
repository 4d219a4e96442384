// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Fleet-wide pattern analysis

use super::{is_off_hours, Alert, AlertKind, DetectionContext, Detector, DetectorError, Severity, FLEET_SUBJECT};

/// Share of the fleet driving during off-hours that is unusual (percent)
pub const OFF_HOURS_ACTIVE_PCT: f64 = 40.0;

/// Fewest driving vehicles needed before the average speed means anything
pub const MIN_DRIVING_FOR_AVERAGE: usize = 4;

/// Fleet average speed considered too high (km/h)
pub const HIGH_AVG_SPEED_KMH: f64 = 80.0;

/// Evaluated once per cycle over the whole fleet, not per vehicle
pub struct FleetPatternDetector;

impl Detector for FleetPatternDetector {
    fn name(&self) -> &'static str {
        "fleet_pattern"
    }

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError> {
        let mut alerts = Vec::new();
        let total = ctx.snapshots.len();
        if total == 0 {
            return Ok(alerts);
        }

        let speeds: Vec<f64> = ctx
            .snapshots
            .iter()
            .filter(|s| s.is_driving)
            .map(|s| if s.speed.is_finite() { s.speed } else { 0.0 })
            .collect();
        let active = speeds.len();
        let active_pct = active as f64 / total as f64 * 100.0;

        if is_off_hours(ctx.now) && active_pct > OFF_HOURS_ACTIVE_PCT {
            alerts.push(ctx.alert(
                FLEET_SUBJECT,
                AlertKind::UnusualActivity,
                Severity::High,
                format!(
                    "📊 {:.0}% of fleet active during off-hours ({}/{})",
                    active_pct, active, total
                ),
            ));
        }

        if active >= MIN_DRIVING_FOR_AVERAGE {
            let avg_speed = speeds.iter().sum::<f64>() / active as f64;
            if avg_speed > HIGH_AVG_SPEED_KMH {
                alerts.push(ctx.alert(
                    FLEET_SUBJECT,
                    AlertKind::HighAvgSpeed,
                    Severity::Medium,
                    format!(
                        "📈 Fleet average speed unusually high: {:.0} km/h across {} active vehicles",
                        avg_speed, active
                    ),
                ));
            }
        }

        Ok(alerts)
    }
}
