//! Detection module - anomaly detectors and alert classification

mod alert;
mod speed;
mod idle;
mod route;
mod after_hours;
mod fleet;
mod location;

pub use alert::*;
pub use speed::SpeedDetector;
pub use idle::IdleDetector;
pub use route::{BoundingBox, OffRouteDetector, METRO_BOUNDS};
pub use after_hours::{is_off_hours, local_hour, AfterHoursDetector};
pub use fleet::FleetPatternDetector;
pub use location::{count_by_location, LocationImbalanceDetector, ReferenceLocation, REFERENCE_LOCATIONS};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::telemetry::{DeviceMap, Snapshot};

/// A detector could not evaluate its input
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("invalid snapshot for vehicle {vehicle_id:?}: {reason}")]
    InvalidSnapshot { vehicle_id: String, reason: String },
}

/// Everything one cycle's detectors see
#[derive(Debug)]
pub struct DetectionContext<'a> {
    pub snapshots: &'a [Snapshot],
    pub devices: &'a DeviceMap,
    pub now: DateTime<Utc>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(snapshots: &'a [Snapshot], devices: &'a DeviceMap, now: DateTime<Utc>) -> Self {
        Self { snapshots, devices, now }
    }

    /// Shorthand for building an alert stamped with this cycle's time
    pub fn alert(&self, subject: Subject<'_>, kind: AlertKind, severity: Severity, message: String) -> Alert {
        Alert::new(subject.id, subject.name, kind, severity, &message, kind.recommendation(), self.now)
    }

    /// Alert subject for a vehicle, named from the device map
    pub fn vehicle<'s>(&'s self, snapshot: &'s Snapshot) -> Subject<'s> {
        Subject {
            id: &snapshot.vehicle_id,
            name: self.devices.name_of(&snapshot.vehicle_id),
        }
    }
}

/// Who an alert is about
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// Synthetic subject for fleet-wide alerts
pub const FLEET_SUBJECT: Subject<'static> = Subject {
    id: "fleet",
    name: "Fleet-wide",
};

/// One anomaly concern evaluated against a whole snapshot set
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &DetectionContext<'_>) -> Result<Vec<Alert>, DetectorError>;
}

/// Reject records a per-vehicle rule cannot reason about
pub(crate) fn check_snapshot(snapshot: &Snapshot) -> Result<(), DetectorError> {
    if snapshot.vehicle_id.is_empty() {
        return Err(DetectorError::InvalidSnapshot {
            vehicle_id: String::new(),
            reason: "missing vehicle id".to_string(),
        });
    }
    if !snapshot.speed.is_finite() {
        return Err(DetectorError::InvalidSnapshot {
            vehicle_id: snapshot.vehicle_id.clone(),
            reason: format!("non-finite speed {}", snapshot.speed),
        });
    }
    Ok(())
}

/// Output of one pipeline pass
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    /// Candidate alerts in detector order
    pub alerts: Vec<Alert>,
    /// Detectors that ran, including ones that failed
    pub detectors_run: usize,
    /// Detectors that returned an error
    pub detectors_failed: usize,
}

/// Fixed, ordered list of detectors
pub struct DetectorPipeline {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorPipeline {
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// The six standard fleet detectors
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(SpeedDetector),
            Box::new(IdleDetector),
            Box::new(OffRouteDetector::new(METRO_BOUNDS)),
            Box::new(AfterHoursDetector),
            Box::new(FleetPatternDetector),
            Box::new(LocationImbalanceDetector::new(&REFERENCE_LOCATIONS)),
        ])
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector; a failing detector is logged and skipped
    pub fn run(&self, ctx: &DetectionContext<'_>) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::default();

        for detector in &self.detectors {
            outcome.detectors_run += 1;
            match detector.evaluate(ctx) {
                Ok(alerts) => {
                    debug!("Detector {} produced {} alerts", detector.name(), alerts.len());
                    outcome.alerts.extend(alerts);
                }
                Err(e) => {
                    outcome.detectors_failed += 1;
                    warn!("Detector {} failed: {}", detector.name(), e);
                }
            }
        }

        outcome
    }
}

impl Default for DetectorPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
