// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Bounded, deduplicated alert history

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use super::RunSummary;
use crate::detection::Alert;

/// Default retention cap
pub const DEFAULT_MAX_ALERTS: usize = 1000;

struct StoreState {
    /// Oldest first
    alerts: VecDeque<Alert>,
    /// Ids of everything in `alerts`
    ids: HashSet<String>,
    summary: Option<RunSummary>,
}

/// Alert history plus the latest run summary, behind one lock.
///
/// Alerts are deduplicated by id against everything currently retained.
/// Once the cap is exceeded the oldest insertions are dropped.
pub struct AlertStore {
    capacity: usize,
    state: Mutex<StoreState>,
}

impl AlertStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(StoreState {
                alerts: VecDeque::with_capacity(capacity.min(DEFAULT_MAX_ALERTS)),
                ids: HashSet::new(),
                summary: None,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert unless an alert with the same id is already held.
    ///
    /// Returns whether the alert was stored; duplicates are a silent no-op.
    pub fn add(&self, alert: Alert) -> bool {
        let mut state = self.state.lock();
        if state.ids.contains(&alert.id) {
            return false;
        }

        state.ids.insert(alert.id.clone());
        state.alerts.push_back(alert);

        while state.alerts.len() > self.capacity {
            if let Some(evicted) = state.alerts.pop_front() {
                state.ids.remove(&evicted.id);
            }
        }
        true
    }

    /// Add several alerts, returning the ones that were actually new
    pub fn add_all(&self, alerts: Vec<Alert>) -> Vec<Alert> {
        alerts
            .into_iter()
            .filter_map(|alert| {
                let copy = alert.clone();
                self.add(alert).then_some(copy)
            })
            .collect()
    }

    /// The last `limit` insertions, timestamp descending.
    ///
    /// Equal timestamps stay in insertion order.
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        let state = self.state.lock();
        let skip = state.alerts.len().saturating_sub(limit);
        let mut recent: Vec<Alert> = state.alerts.iter().skip(skip).cloned().collect();
        // Stable, so ties keep their insertion order
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        let state = self.state.lock();
        state.alerts.iter().find(|a| a.id == id).cloned()
    }

    /// Mark an alert acknowledged. Returns false if it is no longer held.
    pub fn acknowledge(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the latest run summary
    pub fn record_summary(&self, summary: RunSummary) {
        self.state.lock().summary = Some(summary);
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.state.lock().summary.clone()
    }

    /// Count and summary read under the same lock
    pub fn snapshot_counts(&self) -> (usize, Option<RunSummary>) {
        let state = self.state.lock();
        (state.alerts.len(), state.summary.clone())
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ALERTS)
    }
}
