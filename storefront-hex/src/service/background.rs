//! Periodic background work.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A spawned timer loop. Aborted when dropped.
#[derive(Debug)]
pub struct RefreshTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RefreshTask {
    /// Runs `tick` now and then once per `period`.
    ///
    /// A tick that overruns the period delays the next one rather than
    /// bunching up missed ticks.
    pub fn every<F, Fut>(period: Duration, name: &'static str, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tracing::debug!(task = name, "background refresh tick");
                tick().await;
            }
        });
        tracing::info!(task = name, period_secs = period.as_secs(), "background refresh started");
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops the loop. An in-progress tick is dropped at its next await point.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            tracing::info!(task = self.name, "background refresh cancelled");
        }
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
