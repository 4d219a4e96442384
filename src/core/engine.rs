//! Monitor engine - the public face of the alerting core

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use super::{AlertStore, Clock, CycleRunner, Event, EventBus, MonitorStatus, Scheduler};
use crate::config::MonitorConfig;
use crate::detection::{Alert, DetectorPipeline};
use crate::telemetry::SnapshotProvider;

/// Owns the alert store, scheduler and event bus for one monitor instance.
///
/// Lifecycle is construct, `start`, `stop`/`shutdown`, drop.
pub struct Engine {
    config: MonitorConfig,
    store: Arc<AlertStore>,
    events: Arc<EventBus>,
    scheduler: Scheduler,
}

impl Engine {
    pub fn new(config: MonitorConfig, provider: Arc<dyn SnapshotProvider>, clock: Arc<dyn Clock>) -> Self {
        let interval = config.interval();
        Self::with_interval(config, provider, clock, interval)
    }

    /// Like [`Engine::new`] with an explicit cycle period
    pub fn with_interval(
        config: MonitorConfig,
        provider: Arc<dyn SnapshotProvider>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let store = Arc::new(AlertStore::new(config.max_alerts));
        let events = Arc::new(EventBus::new(config.event_capacity));

        info!("Monitor engine using {} telemetry", provider.name());
        let runner = Arc::new(CycleRunner::new(
            provider,
            DetectorPipeline::standard(),
            store.clone(),
            events.clone(),
            clock,
        ));

        Self {
            config,
            store,
            events,
            scheduler: Scheduler::new(runner, interval),
        }
    }

    pub async fn start(&self) {
        self.scheduler.start().await;
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Stop and wait for the background loop to exit
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        info!("Monitor engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Run one cycle now and return the alerts it generated
    pub async fn trigger_check_now(&self) -> Vec<Alert> {
        self.scheduler.run_now().await
    }

    /// Newest alerts first; `limit` is clamped to `1..=max_alert_limit`
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        let limit = limit.clamp(1, self.config.max_alert_limit);
        self.store.recent(limit)
    }

    pub fn default_alert_limit(&self) -> usize {
        self.config.default_alert_limit
    }

    pub fn status(&self) -> MonitorStatus {
        let (total_alerts, run_summary) = self.store.snapshot_counts();
        MonitorStatus {
            running: self.is_running(),
            total_alerts,
            run_summary,
        }
    }

    /// Mark a stored alert as acknowledged
    pub fn acknowledge(&self, alert_id: &str) -> bool {
        self.store.acknowledge(alert_id)
    }

    /// Alerts as they are first stored
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.events.subscribe_alerts()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe_events()
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use crate::detection::AlertKind;
    use crate::telemetry::{DeviceInfo, Snapshot, TelemetryError};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use crate::core::EventType;

    struct FakeFleet {
        devices: Vec<DeviceInfo>,
        snapshots: parking_lot::Mutex<Vec<Snapshot>>,
        failing: AtomicBool,
        status_calls: AtomicUsize,
        /// Delay before answering a status call, in milliseconds
        stall_ms: AtomicU64,
    }

    impl FakeFleet {
        fn new(snapshots: Vec<Snapshot>) -> Arc<Self> {
            let devices = snapshots
                .iter()
                .map(|s| DeviceInfo::new(&s.vehicle_id, &format!("Car {}", s.vehicle_id)))
                .collect();
            Arc::new(Self {
                devices,
                snapshots: parking_lot::Mutex::new(snapshots),
                failing: AtomicBool::new(false),
                status_calls: AtomicUsize::new(0),
                stall_ms: AtomicU64::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotProvider for FakeFleet {
        fn name(&self) -> &str {
            "fake"
        }

        async fn list_devices(&self) -> Result<Vec<DeviceInfo>, TelemetryError> {
            Ok(self.devices.clone())
        }

        async fn live_status(&self) -> Result<Vec<Snapshot>, TelemetryError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let stall = self.stall_ms.load(Ordering::SeqCst);
            if stall > 0 {
                tokio::time::sleep(Duration::from_millis(stall)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(TelemetryError::Api {
                    message: "service unavailable".to_string(),
                });
            }
            Ok(self.snapshots.lock().clone())
        }
    }

    /// Noon local time
    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 20, 5, 0).unwrap()
    }

    fn anomalous_fleet() -> Vec<Snapshot> {
        vec![
            Snapshot::new("b1").driving(true).with_speed(150.0).at(36.15, -115.15),
            Snapshot::new("b2").driving(true).with_speed(125.0).at(37.5, -115.1),
            Snapshot::new("b3").at(36.1445, -115.1787).in_state_for(ChronoDuration::minutes(90)),
            Snapshot::new("b4"),
        ]
    }

    fn engine_with(fleet: Arc<FakeFleet>, clock: Arc<FixedClock>, interval: Duration) -> Engine {
        Engine::with_interval(MonitorConfig::default(), fleet, clock, interval)
    }

    fn ids(alerts: &[Alert]) -> Vec<String> {
        alerts.iter().map(|a| a.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_start_runs_first_cycle_immediately() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet.clone(), Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));

        assert!(engine.status().run_summary.is_none());
        engine.start().await;

        let status = engine.status();
        assert!(status.running);
        let summary = status.run_summary.unwrap();
        assert_eq!(summary.total_vehicles, 4);
        assert_eq!(summary.active_vehicles, 2);
        assert_eq!(summary.checks_run, 6);
        assert_eq!(summary.location_vehicle_counts["W Sahara"], 1);
        assert_eq!(summary.location_vehicle_counts["Losee"], 0);
        assert_eq!(status.total_alerts, summary.alerts_generated);

        // Second start is a no-op
        engine.start().await;
        assert_eq!(fleet.calls(), 1);

        engine.shutdown().await;
        assert!(!engine.status().running);
    }

    #[tokio::test]
    async fn test_stop_halts_background_cycles() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet.clone(), Arc::new(FixedClock::new(noon())), Duration::from_millis(20));

        engine.start().await;
        engine.stop();

        tokio::time::timeout(Duration::from_secs(5), engine.shutdown())
            .await
            .expect("scheduler did not halt in time");

        let after_stop = fleet.calls();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fleet.calls(), after_stop);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_background_loop_keeps_cycling() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet.clone(), Arc::new(FixedClock::new(noon())), Duration::from_millis(20));

        engine.start().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        engine.shutdown().await;

        assert!(fleet.calls() >= 3);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet.clone(), Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));

        engine.start().await;
        engine.shutdown().await;
        engine.start().await;
        assert!(engine.is_running());
        assert_eq!(fleet.calls(), 2);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_dropped_start_can_be_retried() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet.clone(), Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));

        fleet.stall_ms.store(10_000, Ordering::SeqCst);
        assert!(tokio::time::timeout(Duration::from_millis(50), engine.start()).await.is_err());
        assert!(!engine.is_running());

        fleet.stall_ms.store(0, Ordering::SeqCst);
        engine.start().await;
        assert!(engine.is_running());
        assert_eq!(fleet.calls(), 2);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_during_first_cycle_spawns_no_loop() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = Arc::new(engine_with(
            fleet.clone(),
            Arc::new(FixedClock::new(noon())),
            Duration::from_millis(20),
        ));

        fleet.stall_ms.store(100, Ordering::SeqCst);
        let starting = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.start().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        engine.stop();
        starting.await.unwrap();

        fleet.stall_ms.store(0, Ordering::SeqCst);
        let calls = fleet.calls();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fleet.calls(), calls);
        assert!(!engine.is_running());

        engine.start().await;
        assert!(engine.is_running());
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_events_use_cycle_clock() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let clock = Arc::new(FixedClock::new(noon()));
        let engine = engine_with(fleet.clone(), clock.clone(), Duration::from_secs(3600));
        let mut events = engine.subscribe_events();

        engine.trigger_check_now().await;
        fleet.failing.store(true, Ordering::SeqCst);
        clock.advance(ChronoDuration::minutes(10));
        engine.trigger_check_now().await;

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            match event.event_type {
                EventType::CycleFailed => {
                    assert_eq!(event.timestamp, noon() + ChronoDuration::minutes(10));
                    saw_failure = true;
                }
                _ => assert_eq!(event.timestamp, noon()),
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn test_same_hour_is_deduplicated() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let clock = Arc::new(FixedClock::new(noon()));
        let engine = engine_with(fleet, clock.clone(), Duration::from_secs(3600));

        let first = engine.trigger_check_now().await;
        let stored = engine.status().total_alerts;
        assert!(!first.is_empty());
        assert_eq!(stored, first.len());

        clock.advance(ChronoDuration::minutes(30));
        let second = engine.trigger_check_now().await;
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(engine.status().total_alerts, stored);
    }

    #[tokio::test]
    async fn test_new_hour_yields_new_ids() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let clock = Arc::new(FixedClock::new(noon()));
        let engine = engine_with(fleet, clock.clone(), Duration::from_secs(3600));

        let first = engine.trigger_check_now().await;
        clock.advance(ChronoDuration::hours(1));
        let second = engine.trigger_check_now().await;

        let first_ids: HashSet<String> = ids(&first).into_iter().collect();
        assert!(second.iter().all(|a| !first_ids.contains(&a.id)));
        assert_eq!(engine.status().total_alerts, first.len() + second.len());
    }

    #[tokio::test]
    async fn test_upstream_failure_abandons_cycle() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let clock = Arc::new(FixedClock::new(noon()));
        let engine = engine_with(fleet.clone(), clock.clone(), Duration::from_secs(3600));

        engine.trigger_check_now().await;
        let before = engine.status();

        fleet.failing.store(true, Ordering::SeqCst);
        clock.advance(ChronoDuration::hours(2));
        assert!(engine.trigger_check_now().await.is_empty());

        let after = engine.status();
        assert_eq!(after.total_alerts, before.total_alerts);
        assert_eq!(after.run_summary, before.run_summary);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_triggers_do_not_duplicate() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = Arc::new(engine_with(fleet, Arc::new(FixedClock::new(noon())), Duration::from_secs(3600)));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.trigger_check_now().await })
            })
            .collect();

        let mut distinct = HashSet::new();
        for task in tasks {
            distinct.extend(ids(&task.await.unwrap()));
        }

        assert_eq!(engine.status().total_alerts, distinct.len());
        let stored: HashSet<String> = ids(&engine.recent_alerts(200)).into_iter().collect();
        assert_eq!(stored, distinct);
    }

    #[tokio::test]
    async fn test_expected_alerts_for_fleet() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet, Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));

        let kinds: Vec<(String, AlertKind)> = engine
            .trigger_check_now()
            .await
            .into_iter()
            .map(|a| (a.vehicle_id, a.alert_type))
            .collect();

        assert!(kinds.contains(&("b1".to_string(), AlertKind::ExtremeSpeed)));
        assert!(kinds.contains(&("b2".to_string(), AlertKind::HighSpeed)));
        assert!(kinds.contains(&("b2".to_string(), AlertKind::OffRoute)));
        assert!(kinds.contains(&("b3".to_string(), AlertKind::LongIdle)));
        assert!(kinds.contains(&("loc_Losee".to_string(), AlertKind::EmptyLocation)));
        // b4 has no position and no duration
        assert!(kinds.iter().all(|(id, _)| id != "b4"));
    }

    #[tokio::test]
    async fn test_recent_alerts_limit_is_clamped() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet, Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));
        engine.trigger_check_now().await;

        assert_eq!(engine.recent_alerts(0).len(), 1);
        assert_eq!(engine.recent_alerts(10_000).len(), engine.status().total_alerts);
        assert_eq!(engine.default_alert_limit(), 50);
    }

    #[tokio::test]
    async fn test_only_new_alerts_are_broadcast() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet, Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));
        let mut rx = engine.subscribe_alerts();

        let generated = engine.trigger_check_now().await;
        engine.trigger_check_now().await;

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, generated.len());
    }

    #[tokio::test]
    async fn test_acknowledge_through_engine() {
        let fleet = FakeFleet::new(anomalous_fleet());
        let engine = engine_with(fleet, Arc::new(FixedClock::new(noon())), Duration::from_secs(3600));
        let alert = engine.trigger_check_now().await.remove(0);

        assert!(engine.acknowledge(&alert.id));
        assert!(engine.store().get(&alert.id).unwrap().acknowledged);
    }
}
