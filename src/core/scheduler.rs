// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Background scheduler for periodic monitor cycles

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::CycleRunner;
use crate::detection::Alert;

/// Drives a [`CycleRunner`] on a fixed period.
///
/// `start` and `stop` are idempotent. Stopping is cooperative: the loop
/// exits as soon as it is waiting, but a cycle already in flight finishes.
pub struct Scheduler {
    runner: Arc<CycleRunner>,
    period: Duration,
    running: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(runner: Arc<CycleRunner>, period: Duration) -> Self {
        Self {
            runner,
            period,
            running: AtomicBool::new(false),
            cancel: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle inline, then keep cycling in the background
    pub async fn start(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Scheduler already running");
            return;
        }

        let token = CancellationToken::new();
        *self.cancel.lock() = Some(token.clone());

        // Status is populated before start returns
        let guard = StartGuard {
            running: &self.running,
            token: &token,
            armed: true,
        };
        self.runner.run().await;
        guard.disarm();

        if token.is_cancelled() {
            debug!("Monitor stopped during its first cycle");
            return;
        }

        let runner = self.runner.clone();
        let period = self.period;
        let handle = tokio::spawn(run_loop(runner, period, token));
        // A handle left from an earlier start/stop belongs to a cancelled loop
        *self.task.lock() = Some(handle);

        info!("Monitor started, checking every {:?}", self.period);
    }

    /// Signal the background loop to exit
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
        info!("Monitor stop requested");
    }

    /// Stop and wait for the background loop to finish its current cycle
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Monitor loop ended abnormally: {}", e);
            }
        }
    }

    /// Run one cycle on the caller's task, independent of the schedule
    pub async fn run_now(&self) -> Vec<Alert> {
        self.runner.run().await
    }
}

/// Rolls back `running` if a `start` future is dropped mid-cycle
struct StartGuard<'a> {
    running: &'a AtomicBool,
    token: &'a CancellationToken,
    armed: bool,
}

impl StartGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        // A cancelled token means stop already reset the flag
        if self.armed && !self.token.is_cancelled() {
            self.token.cancel();
            self.running.store(false, Ordering::SeqCst);
            warn!("Monitor start abandoned before its first cycle finished");
        }
    }
}

async fn run_loop(runner: Arc<CycleRunner>, period: Duration, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }
        runner.run().await;
    }
    debug!("Monitor loop exited");
}
