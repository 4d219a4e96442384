// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! FleetWatch - fleet telemetry anomaly monitor
//!
//! Periodically samples live vehicle status, runs a fixed battery of
//! detectors over it and keeps a bounded, deduplicated history of the
//! resulting alerts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Monitor Engine                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────┐   ┌─────────────┐        │
//! │  │ Telemetry │ → │ Detector   │ → │ Alert Store │        │
//! │  │ Provider  │   │ Pipeline   │   │ + Summary   │        │
//! │  └───────────┘   └────────────┘   └─────────────┘        │
//! │        ↑                                 ↓               │
//! │  ┌───────────┐                    ┌─────────────┐        │
//! │  │ Scheduler │                    │  Event Bus  │        │
//! │  └───────────┘                    └─────────────┘        │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod core;
pub mod telemetry;
pub mod detection;
pub mod config;

// Re-exports for convenience
pub use config::Config;
pub use self::core::{AlertStore, Engine, EventBus, MonitorStatus, RunSummary, Scheduler};
pub use detection::{Alert, AlertKind, DetectorPipeline, Severity};
pub use telemetry::{DemoFleetProvider, GeotabProvider, Snapshot, SnapshotProvider};

/// FleetWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FleetWatch name
pub const NAME: &str = "FleetWatch";
