// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recreation executor: stop, remove, create, start, and the self-update
//! rename handoff.
//!
//! Every write treats not-found as success so a replayed plan is harmless.

use crate::params::UpdateParams;
use std::collections::BTreeSet;
use std::time::Instant;
use thiserror::Error;
use wt_adapters::{CreateRequest, RemoveOptions, RuntimeApi, RuntimeError};
use wt_core::labels;
use wt_core::{
    rebuild_network_config, short, validate_mac_addresses, Clock, Container, ContainerId,
    EndpointSettings, ImageId, NetworkingConfig,
};

/// Errors from recreating one container. Each names the step that failed.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("stopping {name} ({id}) failed: {source}")]
    Stop {
        name: String,
        id: String,
        #[source]
        source: RuntimeError,
    },
    #[error("removing {name} ({id}) failed: {source}")]
    Remove {
        name: String,
        id: String,
        #[source]
        source: RuntimeError,
    },
    #[error("creating {name} failed: {source}")]
    Create {
        name: String,
        #[source]
        source: RuntimeError,
    },
    #[error("starting {name} ({id}) failed: {source}")]
    Start {
        name: String,
        id: String,
        #[source]
        source: RuntimeError,
    },
    #[error("renaming {name} ({id}) failed: {source}")]
    Rename {
        name: String,
        id: String,
        #[source]
        source: RuntimeError,
    },
    #[error("attaching {name} ({id}) to network {network} failed: {source}")]
    Connect {
        name: String,
        id: String,
        network: String,
        #[source]
        source: RuntimeError,
    },
}

impl ExecError {
    /// Failure kind as reported per entry.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecError::Stop { .. } => "stop-failed",
            ExecError::Remove { .. } => "remove-failed",
            ExecError::Create { .. } => "create-failed",
            ExecError::Start { .. } => "start-failed",
            ExecError::Rename { .. } => "rename-failed",
            ExecError::Connect { .. } => "network-connect-failed",
        }
    }
}

/// Executes recreation steps against the runtime
#[derive(Clone)]
pub struct Executor<R, C: Clock> {
    runtime: R,
    clock: C,
    params: UpdateParams,
}

impl<R: RuntimeApi, C: Clock> Executor<R, C> {
    pub fn new(runtime: R, clock: C, params: UpdateParams) -> Self {
        Self { runtime, clock, params }
    }

    fn elapsed_ms(&self, start: Instant) -> u64 {
        self.clock.elapsed_ms(start)
    }

    /// Stop a running container with its signal and effective timeout.
    pub async fn stop(&self, container: &Container) -> Result<(), ExecError> {
        if !container.is_running() {
            tracing::debug!(container = %container.name(), "not running, skipping stop");
            return Ok(());
        }
        let signal = container.stop_signal();
        let timeout = container
            .stop_timeout()
            .map(std::time::Duration::from_secs)
            .unwrap_or(self.params.stop_timeout);

        let start = self.clock.now();
        match self.runtime.stop_container(container.id(), signal, timeout).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(container = %container.name(), "already gone, nothing to stop");
                return Ok(());
            }
            Err(source) => {
                return Err(ExecError::Stop {
                    name: container.name().to_string(),
                    id: container.id().short().to_string(),
                    source,
                })
            }
        }
        tracing::info!(
            container = %container.name(),
            id = container.id().short(),
            signal,
            timeout_secs = timeout.as_secs(),
            elapsed_ms = self.elapsed_ms(start),
            "stopped"
        );
        Ok(())
    }

    /// Remove the stopped container unless the runtime removes it itself.
    pub async fn remove(&self, container: &Container) -> Result<(), ExecError> {
        if container.host_config().is_some_and(|h| h.auto_remove) {
            tracing::debug!(container = %container.name(), "auto-remove set, skipping remove");
            return Ok(());
        }
        let options = RemoveOptions { force: true, remove_volumes: self.params.remove_volumes };
        let start = self.clock.now();
        match self.runtime.remove_container(container.id(), options).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(container = %container.name(), "already removed");
                return Ok(());
            }
            Err(source) => {
                return Err(ExecError::Remove {
                    name: container.name().to_string(),
                    id: container.id().short().to_string(),
                    source,
                })
            }
        }
        tracing::info!(
            container = %container.name(),
            id = container.id().short(),
            volumes = self.params.remove_volumes,
            elapsed_ms = self.elapsed_ms(start),
            "removed"
        );
        Ok(())
    }

    /// Create the replacement under the container's own name.
    pub async fn create(&self, container: &Container) -> Result<ContainerId, ExecError> {
        let (request, attach) = self.create_request(container, container.name());
        self.create_with(request, attach).await
    }

    /// Start the replacement unless the source was stopped and reviving
    /// stopped containers is off. Returns whether it was started.
    pub async fn start(&self, container: &Container, new_id: &ContainerId) -> Result<bool, ExecError> {
        if !container.is_running() && !self.params.revive_stopped {
            tracing::debug!(container = %container.name(), "source was stopped, leaving replacement stopped");
            return Ok(false);
        }
        let start = self.clock.now();
        match self.runtime.start_container(new_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(container = %container.name(), "replacement already gone");
                return Ok(false);
            }
            Err(source) => {
                return Err(ExecError::Start {
                    name: container.name().to_string(),
                    id: new_id.short().to_string(),
                    source,
                })
            }
        }
        tracing::info!(
            container = %container.name(),
            id = new_id.short(),
            elapsed_ms = self.elapsed_ms(start),
            "started"
        );
        Ok(true)
    }

    /// All four steps for one container.
    pub async fn recreate(&self, container: &Container) -> Result<(ContainerId, bool), ExecError> {
        self.stop(container).await?;
        self.remove(container).await?;
        let new_id = self.create(container).await?;
        let started = self.start(container, &new_id).await?;
        Ok((new_id, started))
    }

    /// Replace the agent's own container.
    ///
    /// The predecessor keeps running under a temporary name while the
    /// successor is created under the original one, carrying the self-marker
    /// and the ids still waiting in `chain`. The successor retires the
    /// predecessor when it starts. If the successor cannot be created or
    /// started, it is removed and the predecessor gets its name back.
    pub async fn handoff(
        &self,
        agent: &Container,
        chain: &[ContainerId],
    ) -> Result<ContainerId, ExecError> {
        let name = agent.name();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let temp_name = format!("{}-{}", name, short(&suffix, 8));
        self.rename(agent, &temp_name).await?;

        let (mut request, attach) = self.create_request(agent, name);
        let labels_map = request.config.labels.get_or_insert_with(Default::default);
        labels_map.insert(labels::SELF_MARKER.to_string(), "true".to_string());
        labels_map.remove(labels::CONTAINER_CHAIN);
        if !chain.is_empty() {
            let ids: Vec<&str> = chain.iter().map(ContainerId::as_str).collect();
            labels_map.insert(labels::CONTAINER_CHAIN.to_string(), ids.join(","));
        }

        let new_id = match self.create_with(request, attach).await {
            Ok(id) => id,
            Err(e) => {
                self.restore_name(agent).await;
                return Err(e);
            }
        };
        if let Err(source) = self.runtime.start_container(&new_id).await {
            let options = RemoveOptions { force: true, remove_volumes: false };
            if let Err(undo) = self.runtime.remove_container(&new_id, options).await {
                tracing::error!(
                    container = %name,
                    id = new_id.short(),
                    error = %undo,
                    "failed to remove agent successor"
                );
            }
            self.restore_name(agent).await;
            return Err(ExecError::Start {
                name: name.to_string(),
                id: new_id.short().to_string(),
                source,
            });
        }
        tracing::info!(
            container = %name,
            predecessor = %temp_name,
            id = new_id.short(),
            chain = chain.len(),
            "started agent successor"
        );
        Ok(new_id)
    }

    /// Remove each distinct image once. Failures are logged, not returned:
    /// an image still used by another container stays behind.
    pub async fn cleanup_images(&self, ids: impl IntoIterator<Item = ImageId>) {
        let mut seen = BTreeSet::new();
        for id in ids {
            if id.is_empty() || !seen.insert(id.clone()) {
                continue;
            }
            match self.runtime.remove_image(&id).await {
                Ok(()) => tracing::info!(image = id.short(), "removed old image"),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(image = id.short(), "old image already gone")
                }
                Err(e) => tracing::warn!(image = id.short(), error = %e, "old image cleanup failed"),
            }
        }
    }

    /// Give the predecessor its original name back after a failed handoff.
    async fn restore_name(&self, agent: &Container) {
        if let Err(e) = self.rename(agent, agent.name()).await {
            tracing::error!(container = %agent.name(), error = %e, "failed to restore agent name");
        }
    }

    async fn rename(&self, container: &Container, new_name: &str) -> Result<(), ExecError> {
        self.runtime.rename_container(container.id(), new_name).await.map_err(|source| {
            ExecError::Rename {
                name: container.name().to_string(),
                id: container.id().short().to_string(),
                source,
            }
        })?;
        tracing::info!(container = %container.name(), to = %new_name, "renamed");
        Ok(())
    }

    /// Create payload for `container` under `name`, plus the endpoints to
    /// attach after create.
    ///
    /// Against a legacy API only the primary endpoint goes into the payload.
    pub(crate) fn create_request(
        &self,
        container: &Container,
        name: &str,
    ) -> (CreateRequest, Vec<(String, EndpointSettings)>) {
        let api = self.runtime.api_version();
        let networking = rebuild_network_config(container, api);
        if let Err(e) = validate_mac_addresses(container, &networking, api) {
            tracing::warn!(container = %container.name(), error = %e, "network config");
        }
        let (networking, attach) = if api.is_legacy() {
            primary_endpoint(container, networking)
        } else {
            (networking, Vec::new())
        };
        let request = CreateRequest {
            name: name.to_string(),
            config: container.get_create_config(),
            host_config: container.get_create_host_config(),
            networking,
            platform: None,
        };
        (request, attach)
    }

    async fn create_with(
        &self,
        request: CreateRequest,
        attach: Vec<(String, EndpointSettings)>,
    ) -> Result<ContainerId, ExecError> {
        let name = request.name.clone();
        let image = request.config.image.clone().unwrap_or_default();
        let start = self.clock.now();
        let new_id = self
            .runtime
            .create_container(request)
            .await
            .map_err(|source| ExecError::Create { name: name.clone(), source })?;

        for (network, endpoint) in attach {
            self.runtime.connect_network(&network, &new_id, endpoint).await.map_err(|source| {
                ExecError::Connect {
                    name: name.clone(),
                    id: new_id.short().to_string(),
                    network: network.clone(),
                    source,
                }
            })?;
        }
        tracing::info!(
            container = %name,
            id = new_id.short(),
            %image,
            elapsed_ms = self.elapsed_ms(start),
            "created"
        );
        Ok(new_id)
    }
}

/// Split endpoints into the one named by the network mode (else the first
/// by name) and the remainder.
fn primary_endpoint(
    container: &Container,
    networking: NetworkingConfig,
) -> (NetworkingConfig, Vec<(String, EndpointSettings)>) {
    let mode = container.host_config().map(|h| h.network_mode()).unwrap_or_default();
    let primary = if networking.endpoints_config.contains_key(mode) {
        Some(mode.to_string())
    } else {
        networking.endpoints_config.keys().next().cloned()
    };

    let mut first = NetworkingConfig::default();
    let mut rest = Vec::new();
    for (name, endpoint) in networking.endpoints_config {
        if Some(&name) == primary.as_ref() {
            first.endpoints_config.insert(name, endpoint);
        } else {
            rest.push((name, endpoint));
        }
    }
    (first, rest)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
