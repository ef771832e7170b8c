//! Periodic and on-demand epoch triggering.

use std::sync::Arc;
use std::time::Duration;

use fence_config::EpochConfig;
use fence_core::boundary::{AssignmentSink, CounterSink, CounterSource, PositionFeed, ZoneSource};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::runner::{EpochRun, EpochRunner};

/// Runs epochs every `interval`, plus whenever the handle triggers one.
#[derive(Debug)]
pub struct Scheduler<S> {
    runner: Arc<EpochRunner<S>>,
    interval: Duration,
    run_on_start: bool,
}

/// Control side of a spawned [`Scheduler`]. Dropping every clone of the
/// handle stops the loop after the current epoch.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    trigger: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Ask for an epoch now. Returns `false` if a request is already queued
    /// or the scheduler has stopped.
    pub fn trigger(&self) -> bool {
        self.trigger.try_send(()).is_ok()
    }

    /// Stop the loop and interrupt the in-flight epoch, if any.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

impl<S> Scheduler<S>
where
    S: PositionFeed + ZoneSource + CounterSource + AssignmentSink + CounterSink + 'static,
{
    #[must_use]
    pub const fn new(runner: Arc<EpochRunner<S>>, config: &EpochConfig) -> Self {
        Self {
            runner,
            interval: config.interval(),
            run_on_start: config.run_on_start,
        }
    }

    /// Spawn the loop on the current runtime. The task resolves to the number
    /// of epochs that completed.
    ///
    /// Shutdown through the returned handle also cancels the runner, so an
    /// epoch in flight stops at the next vehicle and reports itself
    /// interrupted.
    pub fn spawn(self) -> (SchedulerHandle, JoinHandle<u64>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = Arc::clone(&self.runner);

        let mut cancel_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if cancel_rx.wait_for(|stop| *stop).await.is_ok() {
                runner.cancel();
            }
        });

        let task = tokio::spawn(self.run(trigger_rx, shutdown_rx));
        (
            SchedulerHandle {
                trigger: trigger_tx,
                shutdown: shutdown_tx,
            },
            task,
        )
    }

    async fn run(self, mut trigger: mpsc::Receiver<()>, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !self.run_on_start {
            // the first tick completes immediately
            ticker.tick().await;
        }
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        let mut completed = 0;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => debug!("scheduled epoch"),
                Some(()) = trigger.recv() => debug!("manual epoch"),
            }
            if *shutdown.borrow() {
                break;
            }

            match self.runner.run_epoch().await {
                Ok(EpochRun::Completed(_)) => completed += 1,
                Ok(EpochRun::AlreadyRunning) => debug!("epoch skipped, previous still running"),
                Err(error) => error!(%error, "scheduled epoch failed"),
            }
        }

        info!(completed, "scheduler stopped");
        completed
    }
}
