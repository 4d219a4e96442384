// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Snapshot provider trait and common telemetry types

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::TelemetryError;

/// Display name used when a device has no name or is missing from the roster
pub const UNKNOWN_VEHICLE_NAME: &str = "Unknown";

/// A device in the fleet roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
}

impl DeviceInfo {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Instantaneous telemetry for one vehicle.
///
/// Position `(0.0, 0.0)` is the "unknown" sentinel; geo-based detectors
/// skip such vehicles. `current_state_duration` is `None` when the source
/// did not report it or reported something unparseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub vehicle_id: String,
    /// Speed in km/h
    pub speed: f64,
    pub is_driving: bool,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, with = "duration_secs")]
    pub current_state_duration: Option<Duration>,
}

impl Snapshot {
    pub fn new(vehicle_id: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            speed: 0.0,
            is_driving: false,
            latitude: 0.0,
            longitude: 0.0,
            current_state_duration: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn driving(mut self, is_driving: bool) -> Self {
        self.is_driving = is_driving;
        self
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn in_state_for(mut self, duration: Duration) -> Self {
        self.current_state_duration = Some(duration);
        self
    }

    /// False for the `(0, 0)` sentinel
    pub fn has_position(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

/// Vehicle id to display name, rebuilt on every cycle
#[derive(Debug, Clone, Default)]
pub struct DeviceMap {
    names: HashMap<String, String>,
}

impl DeviceMap {
    pub fn from_devices(devices: &[DeviceInfo]) -> Self {
        let names = devices
            .iter()
            .map(|d| (d.id.clone(), d.name.clone()))
            .collect();
        Self { names }
    }

    /// Display name for a vehicle, `"Unknown"` if it is not in the roster
    pub fn name_of(&self, vehicle_id: &str) -> &str {
        self.names
            .get(vehicle_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_VEHICLE_NAME)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Source of the fleet roster and live vehicle status.
///
/// Either call may fail; a failure abandons the current monitor cycle only.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Current device roster
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, TelemetryError>;

    /// One live-status snapshot per reporting vehicle
    async fn live_status(&self) -> Result<Vec<Snapshot>, TelemetryError>;
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.num_seconds()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.map(Duration::seconds))
    }
}
