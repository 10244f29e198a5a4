// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Who am I, and what did my predecessor leave me?

use wt_adapters::{IdentityError, IdentityResolver, RuntimeApi};
use wt_core::{Clock, ContainerId};
use wt_engine::{Startup, UpdateParams};

/// What the first tick needs to know.
#[derive(Debug, PartialEq, Eq)]
pub struct Started {
    /// The agent's own container.
    pub self_id: ContainerId,
    /// Containers the predecessor left for this instance to recreate.
    pub chain: Vec<ContainerId>,
}

/// Detect the agent's container, retire older instances and read the
/// pending chain.
///
/// Fails only when no detection method finds the agent's container. A
/// failed retirement is logged and retried by the next start.
pub async fn startup<R: RuntimeApi, C: Clock>(
    runtime: &R,
    clock: &C,
    identity: &IdentityResolver,
    params: &UpdateParams,
) -> Result<Started, IdentityError> {
    let self_id = identity.detect(runtime).await?;
    tracing::info!(id = self_id.short(), "running in container");

    let chain = match Startup::new(runtime.clone(), clock.clone(), params.clone()).run(&self_id).await {
        Ok(chain) => chain,
        Err(e) => {
            tracing::warn!(error = %e, "startup handoff failed");
            Vec::new()
        }
    };
    Ok(Started { self_id, chain })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
