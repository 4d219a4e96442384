// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Simulated fleet for demo/testing

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use rand::prelude::*;

use super::{DeviceInfo, Snapshot, SnapshotProvider, TelemetryError};
use crate::detection::{METRO_BOUNDS, REFERENCE_LOCATIONS};

/// Generates a plausible fleet around the reference locations.
///
/// Every cycle re-rolls positions and speeds, so alerts show up at a steady
/// trickle: mostly parked cars, some driving, the occasional speeder, idler
/// or vehicle outside the metro area.
pub struct DemoFleetProvider {
    fleet_size: usize,
    rng: Mutex<StdRng>,

    // Scenario probabilities
    speeding_probability: f64,
    driving_probability: f64,
    out_of_metro_probability: f64,
}

impl DemoFleetProvider {
    pub fn new(fleet_size: usize) -> Self {
        Self::with_rng(fleet_size, StdRng::from_entropy())
    }

    /// Deterministic fleet for tests
    pub fn seeded(fleet_size: usize, seed: u64) -> Self {
        Self::with_rng(fleet_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(fleet_size: usize, rng: StdRng) -> Self {
        Self {
            fleet_size,
            rng: Mutex::new(rng),
            speeding_probability: 0.04,
            driving_probability: 0.3,
            out_of_metro_probability: 0.02,
        }
    }

    fn vehicle_id(index: usize) -> String {
        format!("b{}", index + 1)
    }

    fn generate_snapshot(&self, rng: &mut StdRng, index: usize) -> Snapshot {
        let snapshot = Snapshot::new(&Self::vehicle_id(index));
        let roll: f64 = rng.gen();

        if roll < self.out_of_metro_probability {
            // Heading out towards the state line
            return snapshot
                .at(METRO_BOUNDS.lat_max + rng.gen_range(0.1..1.5), rng.gen_range(-115.3..-114.6))
                .with_speed(rng.gen_range(80.0..120.0))
                .driving(true);
        }

        if roll < self.out_of_metro_probability + self.speeding_probability {
            return snapshot
                .at(
                    rng.gen_range(METRO_BOUNDS.lat_min..METRO_BOUNDS.lat_max),
                    rng.gen_range(METRO_BOUNDS.lon_min..METRO_BOUNDS.lon_max),
                )
                .with_speed(rng.gen_range(121.0..155.0))
                .driving(true)
                .in_state_for(Duration::minutes(rng.gen_range(1..30)));
        }

        if roll < self.out_of_metro_probability + self.speeding_probability + self.driving_probability {
            return snapshot
                .at(
                    rng.gen_range(METRO_BOUNDS.lat_min..METRO_BOUNDS.lat_max),
                    rng.gen_range(METRO_BOUNDS.lon_min..METRO_BOUNDS.lon_max),
                )
                .with_speed(rng.gen_range(20.0..110.0))
                .driving(true)
                .in_state_for(Duration::minutes(rng.gen_range(1..45)));
        }

        // Parked near a location; a few have no GPS fix
        if rng.gen::<f64>() < 0.05 {
            return snapshot.in_state_for(Duration::minutes(rng.gen_range(0..30)));
        }
        let location = REFERENCE_LOCATIONS
            .choose(rng)
            .unwrap_or(&REFERENCE_LOCATIONS[0]);
        snapshot
            .at(
                location.latitude + rng.gen_range(-0.003..0.003),
                location.longitude + rng.gen_range(-0.003..0.003),
            )
            .in_state_for(Duration::minutes(rng.gen_range(0..240)))
    }
}

#[async_trait]
impl SnapshotProvider for DemoFleetProvider {
    fn name(&self) -> &str {
        "demo"
    }

    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, TelemetryError> {
        Ok((0..self.fleet_size)
            .map(|i| DeviceInfo {
                id: Self::vehicle_id(i),
                name: format!("Budget LV {:03}", i + 1),
            })
            .collect())
    }

    async fn live_status(&self) -> Result<Vec<Snapshot>, TelemetryError> {
        let mut rng = self.rng.lock();
        Ok((0..self.fleet_size)
            .map(|i| self.generate_snapshot(&mut rng, i))
            .collect())
    }
}
