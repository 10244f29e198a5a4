// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot of the containers on the host.

use crate::params::UpdateParams;
use thiserror::Error;
use wt_adapters::{ContainerStatus, RuntimeApi, RuntimeError};
use wt_core::{normalize_name, short, Container, ContainerDetails, ContainerFilter, SHORT_ID_LEN};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("listing containers failed: {0}")]
    List(#[source] RuntimeError),
    #[error("inspecting container {id} failed: {source}")]
    Inspect {
        id: String,
        #[source]
        source: RuntimeError,
    },
}

/// Lists and inspects host containers.
#[derive(Clone)]
pub struct HostView<R> {
    runtime: R,
}

impl<R: RuntimeApi> HostView<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    /// States to list for this tick.
    pub fn statuses(&self, params: &UpdateParams) -> Vec<ContainerStatus> {
        let mut statuses = vec![ContainerStatus::Running];
        if params.include_stopped {
            statuses.push(ContainerStatus::Created);
            statuses.push(ContainerStatus::Exited);
        }
        if params.include_restarting && !self.runtime.is_podman() {
            statuses.push(ContainerStatus::Restarting);
        }
        statuses
    }

    /// Containers in the tick's states that pass the configured filter.
    pub async fn list(&self, params: &UpdateParams) -> Result<Vec<Container>, HostError> {
        self.list_matching(&self.statuses(params), &params.filter).await
    }

    /// Containers in `statuses` (every state when empty) accepted by `filter`.
    pub async fn list_matching(
        &self,
        statuses: &[ContainerStatus],
        filter: &ContainerFilter,
    ) -> Result<Vec<Container>, HostError> {
        let ids = match self.runtime.list_containers(statuses).await {
            Ok(ids) => ids,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(HostError::List(e)),
        };

        let mut containers = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(container) = self.snapshot(&id).await? else {
                continue;
            };
            if filter.matches(&container) {
                containers.push(container);
            } else {
                tracing::debug!(container = %container.name(), "excluded by filter");
            }
        }
        Ok(containers)
    }

    /// Inspect one container and its image. `None` when it vanished.
    pub async fn snapshot(&self, id: &str) -> Result<Option<Container>, HostError> {
        let mut details = match self.runtime.inspect_container(id).await {
            Ok(d) => d,
            Err(e) if e.is_not_found() => {
                tracing::debug!(id = short(id, SHORT_ID_LEN), "container vanished before inspect");
                return Ok(None);
            }
            Err(e) => return Err(HostError::Inspect { id: id.to_string(), source: e }),
        };
        self.resolve_network_peer(&mut details).await;

        let reference = details.image.clone();
        let image = match self.runtime.inspect_image(&reference).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(
                    container = normalize_name(&details.name),
                    image = %reference,
                    error = %e,
                    "image inspect failed"
                );
                None
            }
        };
        Ok(Some(Container::new(details, image)))
    }

    /// Rewrite `container:<peer-id>` to `container:<peer-name>` so the
    /// reference survives the peer being recreated.
    async fn resolve_network_peer(&self, details: &mut ContainerDetails) {
        let Some(peer) = details
            .host_config
            .as_ref()
            .and_then(|h| h.network_peer())
            .map(String::from)
        else {
            return;
        };
        match self.runtime.inspect_container(&peer).await {
            Ok(peer_details) => {
                let peer_name = normalize_name(&peer_details.name);
                if let Some(host) = details.host_config.as_mut() {
                    host.network_mode = Some(format!("container:{}", peer_name));
                }
            }
            Err(e) => tracing::warn!(
                container = normalize_name(&details.name),
                peer = short(&peer, SHORT_ID_LEN),
                error = %e,
                "network peer inspect failed"
            ),
        }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
