// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::IpamConfig;
use crate::test_support::{fake_id, ContainerBuilder};
use proptest::prelude::*;

const MODERN: ApiVersion = ApiVersion::new(1, 44);
const LEGACY: ApiVersion = ApiVersion::new(1, 43);

fn endpoint(mac: Option<&str>) -> EndpointSettings {
    let mut extra = crate::model::Extra::new();
    extra.insert("NetworkID".into(), "net1".into());
    extra.insert("EndpointID".into(), "ep1".into());
    extra.insert("Gateway".into(), "172.18.0.1".into());
    EndpointSettings {
        ipam_config: Some(IpamConfig {
            ipv4_address: Some("172.18.0.5".into()),
            ..Default::default()
        }),
        aliases: Some(vec!["app".into(), fake_id("app")[..12].to_string()]),
        mac_address: mac.map(String::from),
        ip_address: Some("172.18.0.5".into()),
        dns_names: Some(vec!["app".into()]),
        extra,
    }
}

fn app(mode: &str, mac: Option<&str>) -> Container {
    ContainerBuilder::new("app")
        .network_mode(mode)
        .networks(vec![("appnet", Some(endpoint(mac))), ("gone", None)])
        .build()
}

#[test]
fn nil_endpoints_are_dropped() {
    let config = rebuild_network_config(&app("appnet", Some("02:42:00:00:00:01")), MODERN);
    assert_eq!(config.endpoints_config.keys().collect::<Vec<_>>(), vec!["appnet"]);
}

#[test]
fn modern_keeps_addresses_and_filters_short_id_alias() {
    let config = rebuild_network_config(&app("appnet", Some("02:42:00:00:00:01")), MODERN);
    let ep = &config.endpoints_config["appnet"];
    assert_eq!(ep.aliases, Some(vec!["app".to_string()]));
    assert_eq!(ep.mac_address.as_deref(), Some("02:42:00:00:00:01"));
    assert_eq!(ep.ip_address.as_deref(), Some("172.18.0.5"));
    assert_eq!(ep.dns_names, Some(vec!["app".to_string()]));
    assert_eq!(ep.ipam_config.as_ref().unwrap().ipv4_address.as_deref(), Some("172.18.0.5"));
}

#[test]
fn operational_fields_are_not_copied() {
    let config = rebuild_network_config(&app("appnet", None), MODERN);
    let ep = &config.endpoints_config["appnet"];
    assert!(ep.extra.contains_key("NetworkID"));
    assert!(!ep.extra.contains_key("EndpointID"));
    assert!(!ep.extra.contains_key("Gateway"));
}

#[test]
fn legacy_strips_addresses_but_keeps_ipam() {
    let config = rebuild_network_config(&app("appnet", Some("02:42:00:00:00:01")), LEGACY);
    let ep = &config.endpoints_config["appnet"];
    assert_eq!(ep.mac_address, None);
    assert_eq!(ep.ip_address, None);
    assert_eq!(ep.dns_names, None);
    assert!(ep.ipam_config.is_some());
}

#[test]
fn host_mode_clears_everything() {
    let config = rebuild_network_config(&app("host", Some("02:42:00:00:00:01")), MODERN);
    let ep = &config.endpoints_config["appnet"];
    assert_eq!(ep.aliases, None);
    assert_eq!(ep.ipam_config, None);
    assert_eq!(ep.mac_address, None);
    assert_eq!(ep.ip_address, None);
    assert_eq!(ep.dns_names, None);
}

#[test]
fn validator_accepts_modern_with_mac() {
    let c = app("appnet", Some("02:42:00:00:00:01"));
    let config = rebuild_network_config(&c, MODERN);
    assert_eq!(validate_mac_addresses(&c, &config, MODERN), Ok(()));
}

#[test]
fn validator_flags_missing_mac_on_running_modern() {
    let c = app("appnet", None);
    let config = rebuild_network_config(&c, MODERN);
    assert_eq!(validate_mac_addresses(&c, &config, MODERN), Err(MacAddressError::MissingInNonHost));
}

#[test]
fn validator_ignores_missing_mac_on_stopped_container() {
    let c = ContainerBuilder::new("app")
        .stopped()
        .networks(vec![("appnet", Some(endpoint(None)))])
        .build();
    let config = rebuild_network_config(&c, MODERN);
    assert_eq!(validate_mac_addresses(&c, &config, MODERN), Ok(()));
}

#[test]
fn validator_flags_mac_in_legacy_config() {
    let c = app("appnet", Some("02:42:00:00:00:01"));
    let mut config = rebuild_network_config(&c, MODERN);
    assert!(matches!(
        validate_mac_addresses(&c, &config, LEGACY),
        Err(MacAddressError::UnexpectedInLegacy { .. })
    ));
    config = rebuild_network_config(&c, LEGACY);
    assert_eq!(validate_mac_addresses(&c, &config, LEGACY), Ok(()));
}

#[test]
fn validator_flags_mac_in_host_config() {
    let c = app("host", None);
    let mut config = rebuild_network_config(&c, MODERN);
    if let Some(ep) = config.endpoints_config.get_mut("appnet") {
        ep.mac_address = Some("02:42:00:00:00:01".into());
    }
    assert!(matches!(
        validate_mac_addresses(&c, &config, MODERN),
        Err(MacAddressError::UnexpectedInHost { .. })
    ));
}

proptest! {
    #[test]
    fn legacy_or_host_never_carries_addresses(minor in 20u32..60, host in any::<bool>()) {
        let api = ApiVersion::new(1, minor);
        let c = app(if host { "host" } else { "appnet" }, Some("02:42:00:00:00:01"));
        let config = rebuild_network_config(&c, api);
        if api.is_legacy() || host {
            for ep in config.endpoints_config.values() {
                prop_assert!(ep.mac_address.is_none());
                prop_assert!(ep.ip_address.is_none());
                prop_assert!(ep.dns_names.is_none());
            }
        }
    }
}
