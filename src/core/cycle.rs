// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! A single monitor cycle: fetch, detect, store, summarise

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{AlertStore, Clock, EventBus, RunSummary};
use crate::detection::{count_by_location, Alert, DetectionContext, DetectorPipeline, ReferenceLocation, REFERENCE_LOCATIONS};
use crate::telemetry::{DeviceMap, SnapshotProvider, TelemetryError};

/// Runs the detector pipeline against fresh telemetry
pub struct CycleRunner {
    provider: Arc<dyn SnapshotProvider>,
    pipeline: DetectorPipeline,
    locations: Vec<ReferenceLocation>,
    store: Arc<AlertStore>,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
}

impl CycleRunner {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        pipeline: DetectorPipeline,
        store: Arc<AlertStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            pipeline,
            locations: REFERENCE_LOCATIONS.to_vec(),
            store,
            events,
            clock,
        }
    }

    /// One cycle. Any upstream failure abandons it before anything is recorded.
    pub async fn run_once(&self) -> Result<Vec<Alert>, TelemetryError> {
        let snapshots = self.provider.live_status().await?;
        let devices = self.provider.list_devices().await?;

        // Rebuilt every cycle so roster changes are picked up
        let device_map = DeviceMap::from_devices(&devices);
        let now = self.clock.now();

        let ctx = DetectionContext::new(&snapshots, &device_map, now);
        let outcome = self.pipeline.run(&ctx);
        let generated = outcome.alerts;

        let fresh = self.store.add_all(generated.clone());

        let location_vehicle_counts = count_by_location(&self.locations, &snapshots)
            .into_iter()
            .map(|(location, count)| (location.name.to_string(), count))
            .collect();
        let summary = RunSummary {
            last_check: now,
            total_vehicles: devices.len(),
            active_vehicles: snapshots.iter().filter(|s| s.is_driving).count(),
            alerts_generated: generated.len(),
            checks_run: outcome.detectors_run,
            location_vehicle_counts,
        };
        self.store.record_summary(summary.clone());

        info!(
            "Monitor cycle complete: {} vehicles, {} alerts ({} new), {} checks",
            summary.total_vehicles,
            generated.len(),
            fresh.len(),
            summary.checks_run
        );
        if outcome.detectors_failed > 0 {
            debug!("{} detectors failed this cycle", outcome.detectors_failed);
        }

        for alert in fresh {
            self.events.publish_alert(alert);
        }
        self.events.publish_summary(summary);

        Ok(generated)
    }

    /// One cycle with failures logged and swallowed
    pub async fn run(&self) -> Vec<Alert> {
        match self.run_once().await {
            Ok(alerts) => alerts,
            Err(e) => {
                error!("Monitor cycle abandoned ({}): {}", self.provider.name(), e);
                self.events.publish_failure(&e.to_string(), self.clock.now());
                Vec::new()
            }
        }
    }
}
