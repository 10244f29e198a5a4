// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container snapshot taken once per tick.
//!
//! Everything except the update flags is immutable after construction. The
//! flags sit behind a lock because the planner reads them while transitive
//! flagging writes them.

use crate::id::{normalize_name, ContainerId, ImageId};
use crate::labels::{self, Labels};
use crate::model::{ContainerConfig, ContainerDetails, HostConfig, ImageDetails, PortSet};
use parking_lot::RwLock;
use thiserror::Error;

const DEFAULT_STOP_SIGNAL: &str = "SIGTERM";

/// Errors from validating a snapshot before it enters the update plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("no container info")]
    NoContainerInfo,
    #[error("no image info for {name}")]
    NoImageInfo { name: String },
    #[error("invalid config for {name}: missing config or host config")]
    InvalidConfig { name: String },
}

/// Per-tick flags set by the image checker and the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateFlags {
    pub stale: bool,
    pub linked_to_restarting: bool,
    pub old_image_id: Option<ImageId>,
}

#[derive(Debug)]
pub struct Container {
    id: ContainerId,
    name: String,
    details: ContainerDetails,
    image: Option<ImageDetails>,
    flags: RwLock<UpdateFlags>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            details: self.details.clone(),
            image: self.image.clone(),
            flags: RwLock::new(self.flags.read().clone()),
        }
    }
}

impl Container {
    pub fn new(details: ContainerDetails, image: Option<ImageDetails>) -> Self {
        Self {
            id: ContainerId::new(details.id.clone()),
            name: normalize_name(&details.name).to_string(),
            details,
            image,
            flags: RwLock::new(UpdateFlags::default()),
        }
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Name without the runtime's leading slash.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn details(&self) -> &ContainerDetails {
        &self.details
    }

    pub fn image_info(&self) -> Option<&ImageDetails> {
        self.image.as_ref()
    }

    /// ID of the image the container is running.
    pub fn image_id(&self) -> ImageId {
        ImageId::new(self.details.image.clone())
    }

    /// Image reference used for pulls and recreation.
    ///
    /// The zodiac label wins over `Config.Image`; a reference without any
    /// `:` gets `:latest`.
    pub fn image_name(&self) -> String {
        let name = self
            .label(labels::ZODIAC_ORIGINAL_IMAGE)
            .map(String::from)
            .or_else(|| self.config().and_then(|c| c.image.clone()))
            .unwrap_or_default();
        if name.contains(':') {
            name
        } else {
            format!("{}:latest", name)
        }
    }

    /// Whether the image reference is a content digest rather than a tag.
    pub fn image_is_pinned(&self) -> bool {
        let name = self.image_name();
        name.starts_with("sha256:") || name.contains("@sha256:")
    }

    pub fn config(&self) -> Option<&ContainerConfig> {
        self.details.config.as_ref()
    }

    pub fn host_config(&self) -> Option<&HostConfig> {
        self.details.host_config.as_ref()
    }

    pub fn state(&self) -> &str {
        self.details.state.as_ref().map(|s| s.status.as_str()).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.details.state.as_ref().is_some_and(|s| s.running)
    }

    pub fn is_restarting(&self) -> bool {
        self.details.state.as_ref().is_some_and(|s| s.restarting)
    }

    pub fn labels(&self) -> Labels {
        self.config().map(ContainerConfig::labels).unwrap_or_default()
    }

    /// Non-empty label value.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.config()
            .and_then(|c| c.labels.as_ref())
            .and_then(|l| l.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn bool_label(&self, key: &str) -> Option<bool> {
        self.label(key).and_then(labels::parse_bool)
    }

    pub fn enabled(&self) -> Option<bool> {
        self.bool_label(labels::ENABLE)
    }

    pub fn monitor_only_label(&self) -> Option<bool> {
        self.bool_label(labels::MONITOR_ONLY)
    }

    pub fn no_pull_label(&self) -> Option<bool> {
        self.bool_label(labels::NO_PULL)
    }

    /// Whether this container runs the agent.
    pub fn is_self_marker(&self) -> bool {
        self.bool_label(labels::SELF_MARKER) == Some(true)
    }

    /// Scope label, `None` when unset or empty.
    pub fn scope(&self) -> Option<&str> {
        self.label(labels::SCOPE)
    }

    /// Successor ids carried on an agent container.
    pub fn chain(&self) -> Vec<ContainerId> {
        self.label(labels::CONTAINER_CHAIN)
            .map(labels::split_list)
            .unwrap_or_default()
            .into_iter()
            .map(ContainerId::new)
            .collect()
    }

    pub fn stop_signal(&self) -> &str {
        self.label(labels::STOP_SIGNAL).unwrap_or(DEFAULT_STOP_SIGNAL)
    }

    /// Stop timeout in seconds: the label, else `Config.StopTimeout` when
    /// non-negative, else unset.
    pub fn stop_timeout(&self) -> Option<u64> {
        if let Some(secs) = self.label(labels::STOP_TIMEOUT).and_then(|v| v.trim().parse().ok()) {
            return Some(secs);
        }
        self.config().and_then(|c| c.stop_timeout).and_then(|t| u64::try_from(t).ok())
    }

    /// Identifier used as the dependency-graph key.
    pub fn identifier(&self) -> String {
        let project = self.label(labels::COMPOSE_PROJECT);
        let service = self.label(labels::COMPOSE_SERVICE);
        let number = self.label(labels::COMPOSE_CONTAINER_NUMBER);
        match (project, service, number) {
            (Some(p), Some(s), Some(n)) => format!("{}-{}-{}", p, s, n),
            (Some(p), Some(s), None) => format!("{}-{}", p, s),
            (_, Some(s), _) => s.to_string(),
            _ if !self.name.is_empty() => self.name.clone(),
            _ => self.id.to_string(),
        }
    }

    /// Alternative keys under which other containers may refer to this one.
    pub fn aliases(&self) -> Vec<String> {
        let mut candidates = vec![self.identifier(), self.name.clone()];
        if let Some(service) = self.label(labels::COMPOSE_SERVICE) {
            if let Some(p) = self.label(labels::COMPOSE_PROJECT) {
                candidates.push(format!("{}-{}", p, service));
            }
            candidates.push(service.to_string());
        }
        let mut out: Vec<String> = Vec::with_capacity(candidates.len());
        for c in candidates {
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    /// Names of the containers this one depends on.
    ///
    /// The watchtower `depends-on` label takes absolute precedence, then
    /// compose `depends_on`, then legacy links plus a `container:` network
    /// peer.
    pub fn links(&self) -> Vec<String> {
        if let Some(raw) = self.label(labels::DEPENDS_ON) {
            let deps: Vec<String> = labels::split_list(raw)
                .iter()
                .map(|d| normalize_name(d).to_string())
                .filter(|d| !d.is_empty() && *d != self.name)
                .collect();
            if !deps.is_empty() {
                return deps;
            }
        }

        let project = self.label(labels::COMPOSE_PROJECT);

        if let Some(raw) = self.label(labels::COMPOSE_DEPENDS_ON) {
            let deps: Vec<String> = labels::split_list(raw)
                .iter()
                .filter_map(|entry| entry.split(':').next())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| prefix_project(project, s))
                .collect();
            if !deps.is_empty() {
                return deps;
            }
        }

        let mut deps = Vec::new();
        if let Some(links) = self.host_config().and_then(|h| h.links.as_ref()) {
            for link in links {
                match split_link(link) {
                    Some((name, _)) => deps.push(prefix_project(project, name)),
                    None => tracing::warn!(container = %self.name, link = %link, "ignoring malformed link"),
                }
            }
        }
        if let Some(peer) = self.host_config().and_then(HostConfig::network_peer) {
            deps.push(prefix_project(project, normalize_name(peer)));
        }
        deps
    }

    /// Validate that both snapshots are present and usable for recreation.
    ///
    /// Also initialises `ExposedPorts` when ports are bound but none are
    /// exposed, since the create call requires both.
    pub fn verify_configuration(&mut self) -> Result<(), ModelError> {
        if self.details.id.is_empty() {
            return Err(ModelError::NoContainerInfo);
        }
        if self.image.is_none() {
            return Err(ModelError::NoImageInfo { name: self.name.clone() });
        }
        let has_bindings = match (&self.details.config, &self.details.host_config) {
            (Some(_), Some(host)) => host.port_bindings.as_ref().is_some_and(|b| !b.is_empty()),
            _ => return Err(ModelError::InvalidConfig { name: self.name.clone() }),
        };
        if let Some(config) = self.details.config.as_mut() {
            if has_bindings && config.exposed_ports.is_none() {
                config.exposed_ports = Some(PortSet::new());
            }
        }
        Ok(())
    }

    pub fn flags(&self) -> UpdateFlags {
        self.flags.read().clone()
    }

    pub fn is_stale(&self) -> bool {
        self.flags.read().stale
    }

    /// Mark stale. Once set it stays set for the rest of the tick.
    pub fn set_stale(&self, stale: bool) {
        self.flags.write().stale |= stale;
    }

    pub fn is_linked_to_restarting(&self) -> bool {
        self.flags.read().linked_to_restarting
    }

    pub fn set_linked_to_restarting(&self, linked: bool) {
        self.flags.write().linked_to_restarting = linked;
    }

    pub fn old_image_id(&self) -> Option<ImageId> {
        self.flags.read().old_image_id.clone()
    }

    pub fn set_old_image_id(&self, id: ImageId) {
        self.flags.write().old_image_id = Some(id);
    }

    pub fn to_restart(&self) -> bool {
        let flags = self.flags.read();
        flags.stale || flags.linked_to_restarting
    }
}

/// Split a `name:alias` link into its normalised name and alias.
pub(crate) fn split_link(link: &str) -> Option<(&str, &str)> {
    let (name, alias) = link.split_once(':')?;
    let name = normalize_name(name.trim());
    let alias = alias.trim();
    if name.is_empty() || alias.is_empty() {
        return None;
    }
    Some((name, alias))
}

fn prefix_project(project: Option<&str>, name: &str) -> String {
    match project {
        Some(p) if !name.starts_with(&format!("{}-", p)) => format!("{}-{}", p, name),
        _ => name.to_string(),
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
