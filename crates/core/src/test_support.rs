// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::container::Container;
use crate::model::{
    ContainerConfig, ContainerDetails, ContainerState, EndpointSettings, HostConfig,
    ImageDetails, NetworkSettings,
};
use serde_json::Value;

/// Deterministic 64-hex container id derived from a name.
pub fn fake_id(name: &str) -> String {
    let mut hex: String = name.bytes().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(64);
    format!("{:0<64}", hex)
}

/// Deterministic image id derived from a tag.
pub fn fake_image_id(tag: &str) -> String {
    format!("sha256:{}", fake_id(tag))
}

// ── Container builder ───────────────────────────────────────────────────────

/// Builds inspected container snapshots.
///
/// Defaults: running, image `<name>:latest` with a matching image id,
/// bridge networking with a MAC address, empty image config.
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    details: ContainerDetails,
    image: Option<ImageDetails>,
}

impl ContainerBuilder {
    pub fn new(name: &str) -> Self {
        let image = format!("{}:latest", name);
        let image_id = fake_image_id(&image);
        let mut networks = std::collections::BTreeMap::new();
        networks.insert(
            "bridge".to_string(),
            Some(EndpointSettings {
                aliases: Some(vec![name.to_string()]),
                mac_address: Some("02:42:ac:11:00:02".to_string()),
                ..Default::default()
            }),
        );
        Self {
            details: ContainerDetails {
                id: fake_id(name),
                name: format!("/{}", name),
                image: image_id.clone(),
                state: Some(ContainerState {
                    status: "running".to_string(),
                    running: true,
                    ..Default::default()
                }),
                config: Some(ContainerConfig {
                    hostname: Some(name.to_string()),
                    image: Some(image),
                    labels: Some(Default::default()),
                    ..Default::default()
                }),
                host_config: Some(HostConfig {
                    network_mode: Some("bridge".to_string()),
                    ..Default::default()
                }),
                network_settings: Some(NetworkSettings { networks, ..Default::default() }),
                ..Default::default()
            },
            image: Some(ImageDetails {
                id: image_id,
                config: Some(ContainerConfig::default()),
                ..Default::default()
            }),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.details.id = id.to_string();
        self
    }

    /// Image reference in `Config.Image`; image ids follow the new tag.
    pub fn image(mut self, reference: &str) -> Self {
        let id = fake_image_id(reference);
        self.details.image = id.clone();
        if let Some(c) = self.details.config.as_mut() {
            c.image = Some(reference.to_string());
        }
        if let Some(i) = self.image.as_mut() {
            i.id = id;
        }
        self
    }

    /// Running image id, independent of the image reference.
    pub fn image_id(mut self, id: &str) -> Self {
        self.details.image = id.to_string();
        if let Some(i) = self.image.as_mut() {
            i.id = id.to_string();
        }
        self
    }

    pub fn stopped(mut self) -> Self {
        self.details.state =
            Some(ContainerState { status: "exited".to_string(), ..Default::default() });
        self
    }

    pub fn restarting(mut self) -> Self {
        self.details.state = Some(ContainerState {
            status: "restarting".to_string(),
            running: true,
            restarting: true,
            ..Default::default()
        });
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        if let Some(c) = self.details.config.as_mut() {
            c.labels.get_or_insert_with(Default::default).insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Legacy links as the runtime reports them (`/<target>:/<self>/<alias>`).
    pub fn link(mut self, target: &str) -> Self {
        let entry = format!("/{}:{}/{}", target, self.details.name, target);
        if let Some(h) = self.details.host_config.as_mut() {
            h.links.get_or_insert_with(Vec::new).push(entry);
        }
        self
    }

    pub fn network_mode(mut self, mode: &str) -> Self {
        if let Some(h) = self.details.host_config.as_mut() {
            h.network_mode = Some(mode.to_string());
        }
        self
    }

    /// Replace all endpoints with the given ones.
    pub fn networks(mut self, endpoints: Vec<(&str, Option<EndpointSettings>)>) -> Self {
        let networks = endpoints.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self.details.network_settings = Some(NetworkSettings { networks, ..Default::default() });
        self
    }

    pub fn port_binding(mut self, port: &str, host_port: &str) -> Self {
        if let Some(h) = self.details.host_config.as_mut() {
            h.port_bindings.get_or_insert_with(Default::default).insert(
                port.to_string(),
                serde_json::json!([{ "HostIp": "", "HostPort": host_port }]),
            );
        }
        self
    }

    pub fn auto_remove(mut self) -> Self {
        if let Some(h) = self.details.host_config.as_mut() {
            h.auto_remove = true;
        }
        self
    }

    /// Set an unmodelled host-config field.
    pub fn host_extra(mut self, key: &str, value: Value) -> Self {
        if let Some(h) = self.details.host_config.as_mut() {
            h.extra.insert(key.to_string(), value);
        }
        self
    }

    pub fn config(mut self, f: impl FnOnce(&mut ContainerConfig)) -> Self {
        if let Some(c) = self.details.config.as_mut() {
            f(c);
        }
        self
    }

    pub fn host_config(mut self, f: impl FnOnce(&mut HostConfig)) -> Self {
        if let Some(h) = self.details.host_config.as_mut() {
            f(h);
        }
        self
    }

    pub fn image_config(mut self, f: impl FnOnce(&mut ContainerConfig)) -> Self {
        if let Some(c) = self.image.as_mut().and_then(|i| i.config.as_mut()) {
            f(c);
        }
        self
    }

    pub fn without_image_info(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn without_config(mut self) -> Self {
        self.details.config = None;
        self
    }

    pub fn details(&self) -> ContainerDetails {
        self.details.clone()
    }

    pub fn image_details(&self) -> Option<ImageDetails> {
        self.image.clone()
    }

    pub fn build(self) -> Container {
        Container::new(self.details, self.image)
    }
}
