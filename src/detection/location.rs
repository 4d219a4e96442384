// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Location inventory imbalance detection

use serde::Serialize;

use super::{Alert, AlertKind, DetectionContext, Detector, DetectorError, Severity, Subject};
use crate::telemetry::Snapshot;

/// ~500 m in degree space
pub const LOCATION_RADIUS_DEG: f64 = 0.005;

/// Overstocked at `count >= OVERSTOCK_FACTOR * mean`; the bound is inclusive.
pub const OVERSTOCK_FACTOR: f64 = 2.5;

/// Named rental location with its center coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceLocation {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferenceLocation {
    pub const fn new(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self { name, latitude, longitude }
    }

    /// Squared distance in degree space, compared against the squared radius
    pub fn is_near(&self, latitude: f64, longitude: f64) -> bool {
        let dlat = latitude - self.latitude;
        let dlon = longitude - self.longitude;
        dlat * dlat + dlon * dlon < LOCATION_RADIUS_DEG * LOCATION_RADIUS_DEG
    }

    /// Alert subject id, e.g. `loc_Golden_Nugget`
    pub fn subject_id(&self) -> String {
        format!("loc_{}", self.name.replace(' ', "_"))
    }
}

/// Budget Rent a Car Las Vegas locations
pub static REFERENCE_LOCATIONS: [ReferenceLocation; 8] = [
    ReferenceLocation::new("W Sahara", 36.1445, -115.1787),
    ReferenceLocation::new("Golden Nugget", 36.1707, -115.1440),
    ReferenceLocation::new("Center Strip", 36.1167, -115.1723),
    ReferenceLocation::new("Tropicana", 36.1021, -115.1724),
    ReferenceLocation::new("LAS Airport", 36.0831, -115.1523),
    ReferenceLocation::new("Gibson", 36.0627, -115.1180),
    ReferenceLocation::new("Henderson Executive", 35.9728, -115.1344),
    ReferenceLocation::new("Losee", 36.2144, -115.1250),
];

/// Vehicles parked near each location, in location order.
///
/// A vehicle is counted for the first location in iteration order whose
/// radius it falls within, not the nearest one. Unknown positions are ignored.
pub fn count_by_location<'l>(
    locations: &'l [ReferenceLocation],
    snapshots: &[Snapshot],
) -> Vec<(&'l ReferenceLocation, usize)> {
    let mut counts: Vec<(&ReferenceLocation, usize)> = locations.iter().map(|l| (l, 0)).collect();

    for snapshot in snapshots.iter().filter(|s| s.has_position()) {
        if let Some(entry) = counts
            .iter_mut()
            .find(|(l, _)| l.is_near(snapshot.latitude, snapshot.longitude))
        {
            entry.1 += 1;
        }
    }

    counts
}

/// Flags empty and overstocked locations
pub struct LocationImbalanceDetector {
    locations: Vec<ReferenceLocation>,
}

impl LocationImbalanceDetector {
    pub fn new(locations: &[ReferenceLocation]) -> Self {
        Self {
            locations: locations.to_vec(),
        }
    }

    pub fn locations(&self) -> &[ReferenceLocation] {
        &self.locations
    }
}

impl Detector for LocationImbalanceDetector {
    fn name(&self) -> &'static str {
        "location_imbalance"
    }

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError> {
        let counts = count_by_location(&self.locations, ctx.snapshots);

        let occupied: Vec<usize> = counts.iter().map(|(_, c)| *c).filter(|c| *c > 0).collect();
        if occupied.is_empty() {
            // No reference point to compare against
            return Ok(Vec::new());
        }
        let mean = occupied.iter().sum::<usize>() as f64 / occupied.len() as f64;

        let mut alerts = Vec::new();
        for (location, count) in counts {
            let id = location.subject_id();
            let subject = Subject {
                id: &id,
                name: location.name,
            };

            if count == 0 {
                alerts.push(ctx.alert(
                    subject,
                    AlertKind::EmptyLocation,
                    Severity::High,
                    format!("📍 {} has 0 vehicles — location may need inventory rebalance", location.name),
                ));
            } else if mean > 0.0 && count as f64 >= mean * OVERSTOCK_FACTOR {
                alerts.push(ctx.alert(
                    subject,
                    AlertKind::LocationOverstock,
                    Severity::Low,
                    format!(
                        "📍 {} has {} vehicles (fleet avg: {:.0}) — possible overstock",
                        location.name, count, mean
                    ),
                ));
            }
        }

        Ok(alerts)
    }
}
