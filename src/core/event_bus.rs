// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Event bus for alert fan-out

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::RunSummary;
use crate::detection::Alert;

/// Event types in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Alert,
    CycleCompleted,
    CycleFailed,
}

/// Generic event wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Alert(Alert),
    Summary(RunSummary),
    Error { message: String },
}

/// Best-effort pub/sub for newly stored alerts and cycle outcomes.
///
/// Publishing never blocks; slow receivers lag and lose messages.
pub struct EventBus {
    alert_tx: broadcast::Sender<Alert>,
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (alert_tx, _) = broadcast::channel(capacity.max(1));
        let (event_tx, _) = broadcast::channel(capacity.max(1));

        Self {
            alert_tx,
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    /// Stamped with the alert's own timestamp
    pub fn publish_alert(&self, alert: Alert) {
        let _ = self.alert_tx.send(alert.clone());
        let at = alert.timestamp;
        self.publish_event(EventType::Alert, at, EventPayload::Alert(alert));
    }

    /// Stamped with the cycle's check time
    pub fn publish_summary(&self, summary: RunSummary) {
        let at = summary.last_check;
        self.publish_event(EventType::CycleCompleted, at, EventPayload::Summary(summary));
    }

    pub fn publish_failure(&self, message: &str, at: DateTime<Utc>) {
        self.publish_event(
            EventType::CycleFailed,
            at,
            EventPayload::Error {
                message: message.to_string(),
            },
        );
    }

    fn publish_event(&self, event_type: EventType, timestamp: DateTime<Utc>, payload: EventPayload) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            event_type,
            timestamp,
            payload,
        };
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
