// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One update tick, end to end.
//!
//! ```text
//! list ─► verify ─► pre-check ─► image check ─► plan
//!   ─► pre-update ─► stop (dependents first) ─► remove
//!   ─► create + start (dependencies first) ─► post-update
//!   ─► agent handoff ─► image cleanup ─► post-check ─► notify
//! ```
//!
//! With rolling restart each container runs its own stop/remove/create/
//! start before the next one is touched. Cancellation is honoured between
//! entries; an entry whose first write has happened runs to completion.

use crate::executor::Executor;
use crate::host::{HostError, HostView};
use crate::images::{ImageCheckError, ImageChecker};
use crate::lifecycle::{HookOutcome, HookRunner};
use crate::params::UpdateParams;
use crate::planner::{Plan, Planner};
use crate::report::{Outcome, Report, SkipReason};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use wt_adapters::{NotifyAdapter, RuntimeApi};
use wt_core::{Clock, Container, ContainerId, ImageId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Runs update ticks against one host.
pub struct UpdateSession<R, N, C: Clock> {
    host: HostView<R>,
    images: ImageChecker<R>,
    hooks: HookRunner<R>,
    executor: Executor<R, C>,
    notifier: N,
    clock: C,
    params: UpdateParams,
    self_id: Option<ContainerId>,
    hostname: String,
    /// Ids left by a predecessor, forced into the next tick's plan.
    pending_chain: Mutex<Vec<ContainerId>>,
}

/// Per-container result of the write phases.
struct Done {
    index: usize,
    new_id: ContainerId,
    started: bool,
}

impl<R: RuntimeApi, N: NotifyAdapter, C: Clock> UpdateSession<R, N, C> {
    pub fn new(runtime: R, notifier: N, clock: C, params: UpdateParams) -> Self {
        Self {
            host: HostView::new(runtime.clone()),
            images: ImageChecker::new(runtime.clone()),
            hooks: HookRunner::new(runtime.clone(), params.lifecycle_hooks),
            executor: Executor::new(runtime, clock.clone(), params.clone()),
            notifier,
            clock,
            params,
            self_id: None,
            hostname: "localhost".to_string(),
            pending_chain: Mutex::new(Vec::new()),
        }
    }

    wt_core::setters! {
        into {
            hostname: String,
        }
        option {
            self_id: ContainerId,
        }
    }

    pub fn params(&self) -> &UpdateParams {
        &self.params
    }

    /// Containers the next tick recreates regardless of staleness.
    pub fn resume_chain(&self, ids: Vec<ContainerId>) {
        if !ids.is_empty() {
            tracing::info!(count = ids.len(), "resuming update chain");
        }
        *self.pending_chain.lock() = ids;
    }

    pub async fn tick(&self, cancel: &CancellationToken) -> Result<Report, SessionError> {
        let started = self.clock.now();
        let listed = self.host.list(&self.params).await?;
        tracing::info!(containers = listed.len(), "session started");

        let mut report = Report::new();
        let chain = std::mem::take(&mut *self.pending_chain.lock());
        let mut containers = Vec::with_capacity(listed.len());
        for mut container in listed {
            if let Err(e) = container.verify_configuration() {
                tracing::warn!(container = %container.name(), error = %e, "excluded from update");
                report.record(
                    container.name(),
                    container.id(),
                    Outcome::Skipped(SkipReason::InvalidConfig(e.to_string())),
                    0,
                );
                continue;
            }
            if chain.contains(container.id()) {
                container.set_linked_to_restarting(true);
            }
            containers.push(container);
        }

        for container in &containers {
            if let Err(e) = self.hooks.pre_check(container).await {
                tracing::warn!(container = %container.name(), error = %e, "hook failed");
            }
        }

        let planner = Planner::new(&self.params, self.self_id.as_ref());
        for container in &containers {
            let outcome = self.check(container, planner.no_pull(container), cancel).await;
            report.record(container.name(), container.id(), outcome, 0);
        }

        let plan = planner.plan(&containers);
        for &i in &plan.monitor_only {
            tracing::info!(container = %containers[i].name(), "update available, monitor only");
            report.record(containers[i].name(), containers[i].id(), Outcome::MonitorOnly, 0);
        }
        for &i in &plan.chain {
            report.record(containers[i].name(), containers[i].id(), Outcome::Deferred, 0);
        }

        let order = self.pre_update(&containers, &plan, cancel, &mut report).await;
        let done = if self.params.rolling_restart {
            self.rolling(&containers, &order, cancel, &mut report).await
        } else {
            let stop_order: Vec<usize> =
                plan.stop_order().into_iter().filter(|i| order.contains(i)).collect();
            self.phased(&containers, &stop_order, &order, cancel, &mut report).await
        };

        if let Some(agent) = plan.agent {
            self.handoff(&containers, agent, &plan.chain, cancel, &mut report).await;
        }

        if self.params.cleanup {
            let old: Vec<ImageId> =
                done.iter().filter_map(|d| containers[d.index].old_image_id()).collect();
            self.executor.cleanup_images(old).await;
        }

        let replaced: HashMap<usize, &Done> = done.iter().map(|d| (d.index, d)).collect();
        for (i, container) in containers.iter().enumerate() {
            let result = match replaced.get(&i) {
                Some(d) => self.hooks.post_check(container, &d.new_id, d.started).await,
                None => self.hooks.post_check(container, container.id(), container.is_running()).await,
            };
            if let Err(e) = result {
                tracing::warn!(container = %container.name(), error = %e, "hook failed");
            }
        }

        report.log();
        tracing::debug!(elapsed_ms = self.clock.elapsed_ms(started), "tick finished");
        if let Some(body) = report.notification() {
            let title = format!("Watchtower updates on {}", self.hostname);
            if let Err(e) = self.notifier.notify(&title, &body).await {
                tracing::warn!(error = %e, "notification failed");
            }
        }
        Ok(report)
    }

    async fn check(
        &self,
        container: &Container,
        no_pull: bool,
        cancel: &CancellationToken,
    ) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }
        match self.images.check(container, no_pull, cancel).await {
            Ok(_) => Outcome::Fresh,
            Err(ImageCheckError::Pinned { image }) => {
                tracing::debug!(container = %container.name(), %image, "pinned image, skipping");
                Outcome::Skipped(SkipReason::PinnedImage)
            }
            Err(ImageCheckError::Cancelled) => Outcome::Cancelled,
            Err(e @ ImageCheckError::PullFailed { .. }) => {
                tracing::warn!(container = %container.name(), error = %e, "image check failed");
                Outcome::Failed { kind: "pull-failed", cause: e.to_string() }
            }
        }
    }

    /// Run pre-update hooks in create order; returns the entries to recreate.
    async fn pre_update(
        &self,
        containers: &[Container],
        plan: &Plan,
        cancel: &CancellationToken,
        report: &mut Report,
    ) -> Vec<usize> {
        let mut order = Vec::new();
        for i in plan.create_order() {
            let container = &containers[i];
            if cancel.is_cancelled() {
                report.record(container.name(), container.id(), Outcome::Cancelled, 0);
                continue;
            }
            match self.hooks.pre_update(container).await {
                Ok(HookOutcome::TempFail) => {
                    tracing::info!(container = %container.name(), "pre-update hook postponed update");
                    report.record(
                        container.name(),
                        container.id(),
                        Outcome::Skipped(SkipReason::HookTempFail),
                        0,
                    );
                }
                Ok(_) => order.push(i),
                Err(e) => {
                    tracing::warn!(container = %container.name(), error = %e, "hook failed");
                    order.push(i);
                }
            }
        }
        order
    }

    async fn rolling(
        &self,
        containers: &[Container],
        order: &[usize],
        cancel: &CancellationToken,
        report: &mut Report,
    ) -> Vec<Done> {
        let mut done = Vec::new();
        for &i in order {
            let container = &containers[i];
            if cancel.is_cancelled() {
                report.record(container.name(), container.id(), Outcome::Cancelled, 0);
                continue;
            }
            let start = self.clock.now();
            match self.executor.recreate(container).await {
                Ok((new_id, started)) => {
                    done.push(self.finish(container, i, new_id, started, start, report).await);
                }
                Err(e) => self.fail(container, e.kind(), e.to_string(), start, report),
            }
        }
        done
    }

    async fn phased(
        &self,
        containers: &[Container],
        stop_order: &[usize],
        create_order: &[usize],
        cancel: &CancellationToken,
        report: &mut Report,
    ) -> Vec<Done> {
        let mut begun: HashMap<usize, Instant> = HashMap::new();
        let mut stopped = Vec::new();
        for &i in stop_order {
            let container = &containers[i];
            if cancel.is_cancelled() {
                report.record(container.name(), container.id(), Outcome::Cancelled, 0);
                continue;
            }
            let start = self.clock.now();
            begun.insert(i, start);
            match self.executor.stop(container).await {
                Ok(()) => stopped.push(i),
                Err(e) => self.fail(container, e.kind(), e.to_string(), start, report),
            }
        }

        let mut removed = Vec::new();
        for &i in &stopped {
            let container = &containers[i];
            match self.executor.remove(container).await {
                Ok(()) => removed.push(i),
                Err(e) => self.fail(container, e.kind(), e.to_string(), begun[&i], report),
            }
        }

        let mut done = Vec::new();
        for &i in create_order.iter().filter(|i| removed.contains(i)) {
            let container = &containers[i];
            let start = begun[&i];
            let new_id = match self.executor.create(container).await {
                Ok(id) => id,
                Err(e) => {
                    self.fail(container, e.kind(), e.to_string(), start, report);
                    continue;
                }
            };
            match self.executor.start(container, &new_id).await {
                Ok(started) => {
                    done.push(self.finish(container, i, new_id, started, start, report).await);
                }
                Err(e) => self.fail(container, e.kind(), e.to_string(), start, report),
            }
        }
        done
    }

    async fn handoff(
        &self,
        containers: &[Container],
        agent: usize,
        chain: &[usize],
        cancel: &CancellationToken,
        report: &mut Report,
    ) {
        let container = &containers[agent];
        if cancel.is_cancelled() {
            report.record(container.name(), container.id(), Outcome::Cancelled, 0);
            return;
        }
        let ids: Vec<ContainerId> = chain.iter().map(|&i| containers[i].id().clone()).collect();
        let start = self.clock.now();
        match self.executor.handoff(container, &ids).await {
            Ok(new_id) => report.record(
                container.name(),
                container.id(),
                Outcome::Updated { new_id },
                self.clock.elapsed_ms(start),
            ),
            Err(e) => self.fail(container, e.kind(), e.to_string(), start, report),
        }
    }

    async fn finish(
        &self,
        container: &Container,
        index: usize,
        new_id: ContainerId,
        started: bool,
        start: Instant,
        report: &mut Report,
    ) -> Done {
        if let Err(e) = self.hooks.post_update(container, &new_id, started).await {
            tracing::warn!(container = %container.name(), error = %e, "hook failed");
        }
        report.record(
            container.name(),
            container.id(),
            Outcome::Updated { new_id: new_id.clone() },
            self.clock.elapsed_ms(start),
        );
        Done { index, new_id, started }
    }

    fn fail(
        &self,
        container: &Container,
        kind: &'static str,
        cause: String,
        start: Instant,
        report: &mut Report,
    ) {
        report.record(
            container.name(),
            container.id(),
            Outcome::Failed { kind, cause },
            self.clock.elapsed_ms(start),
        );
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
