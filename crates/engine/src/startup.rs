// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup half of the self-update handoff.
//!
//! A freshly started agent picks up the chain its predecessor left on it
//! and retires every older agent instance in its scope.

use crate::executor::{ExecError, Executor};
use crate::host::{HostError, HostView};
use crate::params::UpdateParams;
use thiserror::Error;
use wt_adapters::{RuntimeApi, RuntimeError};
use wt_core::{scope_matches, Clock, Container, ContainerId};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("agent container {0} not found")]
    SelfMissing(String),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("listing agent instances failed: {0}")]
    List(#[source] RuntimeError),
    #[error("retiring predecessor: {0}")]
    Retire(#[from] ExecError),
}

pub struct Startup<R, C: Clock> {
    runtime: R,
    host: HostView<R>,
    executor: Executor<R, C>,
    params: UpdateParams,
}

impl<R: RuntimeApi, C: Clock> Startup<R, C> {
    pub fn new(runtime: R, clock: C, params: UpdateParams) -> Self {
        Self {
            host: HostView::new(runtime.clone()),
            executor: Executor::new(runtime.clone(), clock, params.clone()),
            runtime,
            params,
        }
    }

    /// Retire predecessors, then return the chain to resume.
    pub async fn run(&self, self_id: &ContainerId) -> Result<Vec<ContainerId>, LifecycleError> {
        let me = self
            .host
            .snapshot(self_id.as_str())
            .await?
            .ok_or_else(|| LifecycleError::SelfMissing(self_id.short().to_string()))?;
        let retired = self.retire_predecessors(&me).await?;
        let chain = me.chain();
        tracing::info!(
            container = %me.name(),
            retired,
            chain = chain.len(),
            "agent startup reconciled"
        );
        Ok(chain)
    }

    /// Stop and remove other self-marked containers in our scope. Returns
    /// how many were retired.
    pub async fn retire_predecessors(&self, me: &Container) -> Result<usize, LifecycleError> {
        let scope = self.params.filter.scope.as_deref();
        let ids = self.runtime.list_containers(&[]).await.map_err(LifecycleError::List)?;

        let mut retired = 0;
        for id in ids {
            if &id == me.id() {
                continue;
            }
            let Some(other) = self.host.snapshot(id.as_str()).await? else {
                continue;
            };
            if !other.is_self_marker() || !scope_matches(scope, other.scope()) {
                continue;
            }
            tracing::info!(container = %other.name(), id = other.id().short(), "retiring previous agent");
            self.executor.stop(&other).await?;
            self.executor.remove(&other).await?;
            if self.params.cleanup && other.image_id() != me.image_id() {
                self.executor.cleanup_images([other.image_id()]).await;
            }
            retired += 1;
        }
        Ok(retired)
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
