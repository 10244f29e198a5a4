// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::PortSet;
use crate::test_support::ContainerBuilder;
use proptest::prelude::*;

fn s(v: &[&str]) -> Option<Vec<String>> {
    Some(v.iter().map(|x| x.to_string()).collect())
}

fn set(keys: &[&str]) -> Option<PortSet> {
    Some(keys.iter().map(|k| (k.to_string(), Empty {})).collect())
}

#[test]
fn image_defaults_are_cleared() {
    let c = ContainerBuilder::new("web")
        .config(|c| {
            c.working_dir = Some("/app".into());
            c.user = Some("nobody".into());
            c.entrypoint = s(&["/entry"]);
            c.cmd = s(&["serve"]);
            c.env = s(&["PATH=/bin", "MODE=prod"]);
        })
        .image_config(|i| {
            i.working_dir = Some("/app".into());
            i.user = Some("nobody".into());
            i.entrypoint = s(&["/entry"]);
            i.cmd = s(&["serve"]);
            i.env = s(&["PATH=/bin"]);
        })
        .build();
    let config = c.get_create_config();
    assert_eq!(config.working_dir, None);
    assert_eq!(config.user, None);
    assert_eq!(config.entrypoint, None);
    assert_eq!(config.cmd, None);
    assert_eq!(config.env, s(&["MODE=prod"]));
}

#[test]
fn cmd_kept_when_entrypoint_differs() {
    let c = ContainerBuilder::new("web")
        .config(|c| {
            c.entrypoint = s(&["/custom"]);
            c.cmd = s(&["serve"]);
        })
        .image_config(|i| {
            i.entrypoint = s(&["/entry"]);
            i.cmd = s(&["serve"]);
        })
        .build();
    let config = c.get_create_config();
    assert_eq!(config.entrypoint, s(&["/custom"]));
    assert_eq!(config.cmd, s(&["serve"]));
}

#[test]
fn cmd_kept_when_it_differs_from_image() {
    let c = ContainerBuilder::new("web")
        .config(|c| c.cmd = s(&["worker"]))
        .image_config(|i| i.cmd = s(&["serve"]))
        .build();
    assert_eq!(c.get_create_config().cmd, s(&["worker"]));
}

#[test]
fn healthcheck_subfields_are_subtracted_individually() {
    let c = ContainerBuilder::new("web")
        .config(|c| {
            c.healthcheck = Some(HealthConfig {
                test: s(&["CMD", "true"]),
                interval: Some(30),
                retries: Some(5),
                ..Default::default()
            })
        })
        .image_config(|i| {
            i.healthcheck = Some(HealthConfig {
                test: s(&["CMD", "true"]),
                interval: Some(10),
                retries: Some(5),
                ..Default::default()
            })
        })
        .build();
    let health = c.get_create_config().healthcheck.unwrap();
    assert_eq!(health.test, None);
    assert_eq!(health.interval, Some(30));
    assert_eq!(health.retries, None);
}

#[test]
fn image_labels_are_removed_but_self_marker_survives() {
    let c = ContainerBuilder::new("watchtower")
        .label(labels::SELF_MARKER, "true")
        .label("maintainer", "someone")
        .label("custom", "mine")
        .image_config(|i| {
            let l = i.labels.get_or_insert_with(Default::default);
            l.insert(labels::SELF_MARKER.into(), "true".into());
            l.insert("maintainer".into(), "someone".into());
            l.insert("custom".into(), "theirs".into());
        })
        .build();
    let out = c.get_create_config().labels.unwrap();
    assert_eq!(out.get(labels::SELF_MARKER).map(String::as_str), Some("true"));
    assert_eq!(out.get("custom").map(String::as_str), Some("mine"));
    assert!(!out.contains_key("maintainer"));
}

#[test]
fn volumes_and_ports_are_key_subtracted() {
    let c = ContainerBuilder::new("web")
        .config(|c| {
            c.volumes = set(&["/data", "/cache"]);
            c.exposed_ports = set(&["80/tcp", "9000/tcp"]);
        })
        .image_config(|i| {
            i.volumes = set(&["/data"]);
            i.exposed_ports = set(&["80/tcp"]);
        })
        .build();
    let config = c.get_create_config();
    assert_eq!(config.volumes.unwrap().keys().collect::<Vec<_>>(), vec!["/cache"]);
    assert_eq!(config.exposed_ports.unwrap().keys().collect::<Vec<_>>(), vec!["9000/tcp"]);
}

#[test]
fn bound_ports_are_exposed_even_if_image_exposes_them() {
    let c = ContainerBuilder::new("web")
        .port_binding("80/tcp", "8080")
        .config(|c| c.exposed_ports = set(&["80/tcp"]))
        .image_config(|i| i.exposed_ports = set(&["80/tcp"]))
        .build();
    let ports: PortSet = c.get_create_config().exposed_ports.unwrap();
    assert!(ports.contains_key("80/tcp"));
}

#[yare::parameterized(
    bridge         = { "bridge",          None,          true },
    container_peer = { "container:vpn",   None,          false },
    uts_host       = { "bridge",          Some("host"),  false },
    uts_empty      = { "bridge",          Some(""),      true },
)]
fn hostname_handling(mode: &str, uts: Option<&str>, kept: bool) {
    let c = ContainerBuilder::new("web")
        .network_mode(mode)
        .host_config(|h| h.uts_mode = uts.map(String::from))
        .build();
    assert_eq!(c.get_create_config().hostname.is_some(), kept);
}

#[test]
fn create_config_image_is_image_name() {
    let c = ContainerBuilder::new("web").config(|c| c.image = Some("nginx".into())).build();
    assert_eq!(c.get_create_config().image.as_deref(), Some("nginx:latest"));
}

#[test]
fn host_config_links_are_rewritten() {
    let c = ContainerBuilder::new("web")
        .link("api")
        .host_config(|h| {
            let links = h.links.get_or_insert_with(Vec::new);
            links.push("db:database".into());
            links.push("broken".into());
            links.push(":alias".into());
        })
        .build();
    let host = c.get_create_host_config();
    assert_eq!(host.links, s(&["api:api", "db:database"]));
}

#[test]
fn host_config_keeps_unmodelled_fields() {
    let c = ContainerBuilder::new("web")
        .host_extra("RestartPolicy", serde_json::json!({ "Name": "always" }))
        .build();
    let host = c.get_create_host_config();
    assert_eq!(host.extra["RestartPolicy"]["Name"], "always");
}

proptest! {
    #[test]
    fn create_config_subtracts_any_shared_env(
        shared in proptest::collection::btree_set("[A-Z]{1,4}=[a-z]{0,3}", 0..4),
        own in proptest::collection::btree_set("[a-z]{1,4}=[0-9]{0,3}", 0..4),
    ) {
        let shared: Vec<String> = shared.into_iter().collect();
        let own: Vec<String> = own.into_iter().collect();
        let all: Vec<String> = shared.iter().chain(own.iter()).cloned().collect();
        let image_env = shared.clone();
        let c = ContainerBuilder::new("web")
            .config(|c| c.env = Some(all))
            .image_config(|i| i.env = Some(image_env))
            .build();
        let config = c.get_create_config();
        prop_assert_eq!(config.image.clone(), Some(c.image_name()));
        prop_assert_eq!(config.env.unwrap_or_default(), own);
    }
}
