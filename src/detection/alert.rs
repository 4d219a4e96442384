// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Alert model and identity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of the hex identifier kept from the digest
const ALERT_ID_LEN: usize = 12;

/// Severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    // Per vehicle
    ExtremeSpeed,
    HighSpeed,
    ExcessiveIdle,
    LongIdle,
    OffRoute,
    AfterHours,

    // Fleet-wide
    UnusualActivity,
    HighAvgSpeed,

    // Per location
    EmptyLocation,
    LocationOverstock,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ExtremeSpeed => "extreme_speed",
            AlertKind::HighSpeed => "high_speed",
            AlertKind::ExcessiveIdle => "excessive_idle",
            AlertKind::LongIdle => "long_idle",
            AlertKind::OffRoute => "off_route",
            AlertKind::AfterHours => "after_hours",
            AlertKind::UnusualActivity => "unusual_activity",
            AlertKind::HighAvgSpeed => "high_avg_speed",
            AlertKind::EmptyLocation => "empty_location",
            AlertKind::LocationOverstock => "location_overstock",
        }
    }

    /// Remediation hint appended to the alert message
    pub fn recommendation(&self) -> &'static str {
        match self {
            AlertKind::ExtremeSpeed => "Immediate intervention recommended. Contact driver.",
            AlertKind::HighSpeed => "Review driver behavior pattern.",
            AlertKind::ExcessiveIdle => "Check if vehicle is abandoned or unauthorized stop.",
            AlertKind::LongIdle => "Monitor for extended pattern.",
            AlertKind::OffRoute => "Verify if authorized trip. May indicate unauthorized use.",
            AlertKind::AfterHours => "After-hours usage flagged for review.",
            AlertKind::UnusualActivity => "Unusual fleet-wide activity pattern detected.",
            AlertKind::HighAvgSpeed => "Review driver training compliance.",
            AlertKind::EmptyLocation => "Consider dispatching vehicles from nearby locations.",
            AlertKind::LocationOverstock => "Consider redistributing to lower-inventory locations.",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified monitor event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub alert_type: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(
        vehicle_id: &str,
        vehicle_name: &str,
        kind: AlertKind,
        severity: Severity,
        message: &str,
        recommendation: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let message = if recommendation.is_empty() {
            message.to_string()
        } else {
            format!("{} 💡 {}", message, recommendation)
        };

        Self {
            id: alert_id(vehicle_id, kind, now),
            vehicle_id: vehicle_id.to_string(),
            vehicle_name: vehicle_name.to_string(),
            alert_type: kind,
            severity,
            message,
            timestamp: now,
            acknowledged: false,
        }
    }
}

/// Identifier for `(vehicle, type, UTC hour)`.
///
/// The same vehicle and type collapse to one id for the whole clock hour,
/// which is what deduplicates repeated cycles.
pub fn alert_id(vehicle_id: &str, kind: AlertKind, now: DateTime<Utc>) -> String {
    let key = format!("{}{}{}", vehicle_id, kind.as_str(), now.format("%Y%m%d%H"));
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(ALERT_ID_LEN);
    hex
}
