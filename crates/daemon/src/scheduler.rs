// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tick loop: one tick at once, then one per interval until cancelled.

use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use wt_adapters::{NotifyAdapter, RuntimeApi};
use wt_core::Clock;
use wt_engine::{SessionError, UpdateSession};

pub struct Scheduler<R, N, C: Clock> {
    session: UpdateSession<R, N, C>,
    interval: Duration,
    run_once: bool,
}

impl<R: RuntimeApi, N: NotifyAdapter, C: Clock> Scheduler<R, N, C> {
    pub fn new(session: UpdateSession<R, N, C>, interval: Duration, run_once: bool) -> Self {
        Self { session, interval, run_once }
    }

    /// Run until `cancel` fires (or after one tick with run-once). Returns
    /// the number of ticks run.
    ///
    /// Ticks run inline, so a slow tick delays the next one instead of
    /// overlapping it. A failed tick is logged and retried next interval;
    /// with run-once its error is returned.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<u64, SessionError> {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }
            ticks += 1;
            match self.session.tick(cancel).await {
                Ok(_) => {}
                Err(e) if self.run_once => return Err(e),
                Err(e) => tracing::error!(error = %e, "update tick failed"),
            }
            if self.run_once {
                break;
            }
        }
        tracing::info!(ticks, "scheduler stopped");
        Ok(ticks)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
