// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! After-hours activity detection

use chrono::{DateTime, Timelike, Utc};

use super::{check_snapshot, Alert, AlertKind, DetectionContext, Detector, DetectorError, Severity};

/// Fixed local offset from UTC in hours. No DST handling.
pub const LOCAL_UTC_OFFSET_HOURS: i32 = -8;

/// Local hour the off-hours window opens
pub const OFF_HOURS_START: u32 = 23;

/// Local hour the off-hours window closes
pub const OFF_HOURS_END: u32 = 5;

/// Speed above which a non-driving vehicle still counts as active (km/h)
pub const ACTIVE_SPEED_KMH: f64 = 5.0;

/// Local wall-clock hour for a UTC instant
pub fn local_hour(now: DateTime<Utc>) -> u32 {
    (now.hour() as i32 + LOCAL_UTC_OFFSET_HOURS).rem_euclid(24) as u32
}

/// True between 23:00 and 05:00 local
pub fn is_off_hours(now: DateTime<Utc>) -> bool {
    let hour = local_hour(now);
    hour >= OFF_HOURS_START || hour < OFF_HOURS_END
}

/// Flags vehicles in use during the overnight window
pub struct AfterHoursDetector;

impl Detector for AfterHoursDetector {
    fn name(&self) -> &'static str {
        "after_hours"
    }

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError> {
        if !is_off_hours(ctx.now) {
            return Ok(Vec::new());
        }
        let hour = local_hour(ctx.now);
        let mut alerts = Vec::new();

        for snapshot in ctx.snapshots {
            check_snapshot(snapshot)?;
            if !(snapshot.is_driving || snapshot.speed > ACTIVE_SPEED_KMH) {
                continue;
            }

            let subject = ctx.vehicle(snapshot);
            alerts.push(ctx.alert(
                subject,
                AlertKind::AfterHours,
                Severity::Medium,
                format!("🌙 {} active during off-hours (local {}:00)", subject.name, hour),
            ));
        }

        Ok(alerts)
    }
}
