// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Creation configs derived from a running container.
//!
//! Recreating from a verbatim copy of the inspected config would freeze the
//! old image's defaults into the new container, so every field that still
//! equals the image's value is cleared and left for the new image to supply.

use crate::container::{split_link, Container};
use crate::labels;
use crate::model::{ContainerConfig, Empty, HealthConfig, HostConfig};

impl Container {
    /// Runtime config for the replacement container.
    pub fn get_create_config(&self) -> ContainerConfig {
        let mut config = self.config().cloned().unwrap_or_default();
        let host = self.host_config().cloned().unwrap_or_default();

        if let Some(image) = self.image_info().and_then(|i| i.config.as_ref()) {
            subtract_image_defaults(&mut config, image);
        }

        if let Some(bindings) = host.port_bindings.as_ref() {
            let exposed = config.exposed_ports.get_or_insert_with(Default::default);
            for port in bindings.keys() {
                exposed.entry(port.clone()).or_insert(Empty {});
            }
        }

        let uts_set = host.uts_mode.as_deref().is_some_and(|m| !m.is_empty());
        if host.network_peer().is_some() || uts_set {
            config.hostname = None;
        }

        config.image = Some(self.image_name());
        config
    }

    /// Host config for the replacement, with links rewritten to `name:alias`.
    pub fn get_create_host_config(&self) -> HostConfig {
        let mut host = self.host_config().cloned().unwrap_or_default();
        if let Some(links) = host.links.take() {
            let rewritten: Vec<String> = links
                .iter()
                .filter_map(|link| {
                    let rewritten = split_link(link)
                        .map(|(name, alias)| format!("{}:{}", name, link_alias(alias)));
                    if rewritten.is_none() {
                        tracing::warn!(container = %self.name(), link = %link, "dropping malformed link");
                    }
                    rewritten
                })
                .collect();
            host.links = Some(rewritten);
        }
        host
    }
}

/// Alias portion of a link. The runtime reports aliases as
/// `/<container>/<alias>`; only the last segment is meaningful.
fn link_alias(alias: &str) -> &str {
    alias.rsplit('/').next().filter(|a| !a.is_empty()).unwrap_or(alias)
}

fn subtract_image_defaults(config: &mut ContainerConfig, image: &ContainerConfig) {
    if config.working_dir == image.working_dir {
        config.working_dir = None;
    }
    if config.user == image.user {
        config.user = None;
    }

    if let (Some(health), Some(image_health)) = (config.healthcheck.as_mut(), &image.healthcheck) {
        subtract_health(health, image_health);
    }

    if config.entrypoint == image.entrypoint {
        config.entrypoint = None;
        if config.cmd == image.cmd {
            config.cmd = None;
        }
    }

    if let (Some(label_map), Some(image_labels)) = (config.labels.as_mut(), &image.labels) {
        let marker = label_map.get(labels::SELF_MARKER).cloned();
        label_map.retain(|k, v| image_labels.get(k).map(String::as_str) != Some(v.as_str()));
        if let Some(marker) = marker {
            label_map.insert(labels::SELF_MARKER.to_string(), marker);
        }
    }

    if let (Some(env), Some(image_env)) = (config.env.as_mut(), &image.env) {
        env.retain(|e| !image_env.contains(e));
    }

    if let (Some(volumes), Some(image_volumes)) = (config.volumes.as_mut(), &image.volumes) {
        volumes.retain(|k, _| !image_volumes.contains_key(k));
    }

    if let (Some(ports), Some(image_ports)) = (config.exposed_ports.as_mut(), &image.exposed_ports) {
        ports.retain(|k, _| !image_ports.contains_key(k));
    }
}

fn subtract_health(health: &mut HealthConfig, image: &HealthConfig) {
    if health.test == image.test {
        health.test = None;
    }
    if health.retries == image.retries {
        health.retries = None;
    }
    if health.interval == image.interval {
        health.interval = None;
    }
    if health.timeout == image.timeout {
        health.timeout = None;
    }
    if health.start_period == image.start_period {
        health.start_period = None;
    }
}

#[cfg(test)]
#[path = "create_config_tests.rs"]
mod tests;
