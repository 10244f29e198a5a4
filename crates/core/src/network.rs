// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Creation-time network config rebuilt from a container's live endpoints.

use crate::api_version::ApiVersion;
use crate::container::Container;
use crate::model::{EndpointSettings, NetworkingConfig};
use std::collections::BTreeMap;
use thiserror::Error;

/// MAC address placement problems in a rebuilt network config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacAddressError {
    #[error("unexpected MAC address in legacy API config for endpoint {endpoint}")]
    UnexpectedInLegacy { endpoint: String },
    #[error("unexpected MAC address in host network config for endpoint {endpoint}")]
    UnexpectedInHost { endpoint: String },
    #[error("no MAC address on any endpoint of a running non-host container")]
    MissingInNonHost,
}

/// Rebuild the endpoints of `container` for a create call against `api`.
///
/// Operational fields assigned by the daemon (endpoint ids, gateways, prefix
/// lengths) are never copied.
pub fn rebuild_network_config(container: &Container, api: ApiVersion) -> NetworkingConfig {
    let host_mode = container.host_config().is_some_and(|h| h.is_host_network());
    let strip_addresses = host_mode || api.is_legacy();
    let short_id = container.id().short();

    let mut endpoints = BTreeMap::new();
    let networks = container.details().network_settings.as_ref().map(|n| &n.networks);
    for (name, endpoint) in networks.into_iter().flatten() {
        let Some(source) = endpoint else {
            continue;
        };
        let mut target = EndpointSettings {
            extra: source
                .extra
                .iter()
                .filter(|(k, _)| !OPERATIONAL_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ..Default::default()
        };

        if !host_mode {
            target.aliases = source.aliases.as_ref().map(|aliases| {
                aliases.iter().filter(|a| a.as_str() != short_id).cloned().collect()
            });
            target.ipam_config = source.ipam_config.clone();
        }

        if !strip_addresses {
            target.mac_address = source.mac_address.clone();
            target.ip_address = source.ip_address.clone();
            target.dns_names = source.dns_names.clone();
        }

        endpoints.insert(name.clone(), target);
    }

    NetworkingConfig { endpoints_config: endpoints }
}

const OPERATIONAL_KEYS: &[&str] = &[
    "EndpointID",
    "Gateway",
    "IPPrefixLen",
    "IPv6Gateway",
    "GlobalIPv6Address",
    "GlobalIPv6PrefixLen",
];

/// Check MAC placement in a rebuilt config.
///
/// Stopped containers and the expected-absence cases pass; they are only
/// worth a debug line.
pub fn validate_mac_addresses(
    container: &Container,
    config: &NetworkingConfig,
    api: ApiVersion,
) -> Result<(), MacAddressError> {
    let host_mode = container.host_config().is_some_and(|h| h.is_host_network());
    let with_mac = config.endpoints_config.iter().find(|(_, e)| e.has_mac());

    match (with_mac, host_mode, api.is_legacy()) {
        (Some((endpoint, _)), true, _) => {
            Err(MacAddressError::UnexpectedInHost { endpoint: endpoint.clone() })
        }
        (Some((endpoint, _)), false, true) => {
            Err(MacAddressError::UnexpectedInLegacy { endpoint: endpoint.clone() })
        }
        (None, false, false) if container.is_running() && !config.endpoints_config.is_empty() => {
            Err(MacAddressError::MissingInNonHost)
        }
        (Some(_), false, false) => Ok(()),
        (None, _, _) => {
            tracing::debug!(
                container = %container.name(),
                host_mode,
                api = %api,
                running = container.is_running(),
                "no MAC address in network config"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
