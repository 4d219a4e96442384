// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Off-route detection against the metro bounding box

use serde::{Deserialize, Serialize};

use super::{check_snapshot, Alert, AlertKind, DetectionContext, Detector, DetectorError, Severity};

/// Latitude/longitude rectangle, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }
}

/// Las Vegas metro area (rough)
pub const METRO_BOUNDS: BoundingBox = BoundingBox {
    lat_min: 35.90,
    lat_max: 36.30,
    lon_min: -115.35,
    lon_max: -115.00,
};

/// Flags vehicles with a known position outside the service area
pub struct OffRouteDetector {
    bounds: BoundingBox,
}

impl OffRouteDetector {
    pub fn new(bounds: BoundingBox) -> Self {
        Self { bounds }
    }
}

impl Detector for OffRouteDetector {
    fn name(&self) -> &'static str {
        "off_route"
    }

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError> {
        let mut alerts = Vec::new();

        for snapshot in ctx.snapshots {
            check_snapshot(snapshot)?;
            if !snapshot.has_position() || self.bounds.contains(snapshot.latitude, snapshot.longitude) {
                continue;
            }

            let subject = ctx.vehicle(snapshot);
            alerts.push(ctx.alert(
                subject,
                AlertKind::OffRoute,
                Severity::High,
                format!(
                    "🗺️ {} detected outside Las Vegas metro area ({:.4}, {:.4})",
                    subject.name, snapshot.latitude, snapshot.longitude
                ),
            ));
        }

        Ok(alerts)
    }
}
