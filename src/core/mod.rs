//! Core module - alert store, monitor cycle, scheduling and status

mod clock;
mod store;
mod cycle;
mod scheduler;
mod engine;
mod event_bus;

pub use clock::{Clock, FixedClock, SystemClock};
pub use store::{AlertStore, DEFAULT_MAX_ALERTS};
pub use cycle::CycleRunner;
pub use scheduler::Scheduler;
pub use engine::Engine;
pub use event_bus::{Event, EventBus, EventPayload, EventType};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the latest completed monitor cycle.
///
/// Replaced wholesale each cycle; it never accumulates history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub last_check: DateTime<Utc>,
    /// Devices in the roster
    pub total_vehicles: usize,
    /// Vehicles currently driving
    pub active_vehicles: usize,
    /// Candidate alerts produced, duplicates included
    pub alerts_generated: usize,
    /// Detectors executed
    pub checks_run: usize,
    pub location_vehicle_counts: BTreeMap<String, usize>,
}

/// Monitor state exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub running: bool,
    /// Alerts currently retained
    pub total_alerts: usize,
    pub run_summary: Option<RunSummary>,
}
