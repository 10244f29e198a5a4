// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bollard::models::{ContainerConfig as BollardConfig, ContainerInspectResponse, ContainerState};
use wt_core::{ContainerConfig, HostConfig, NetworkingConfig};

#[test]
fn not_found_maps_to_not_found() {
    let e = BollardError::DockerResponseServerError { status_code: 404, message: "gone".into() };
    assert_eq!(RuntimeError::from(e), RuntimeError::NotFound("gone".into()));
}

#[test]
fn other_status_maps_to_api_error() {
    let e = BollardError::DockerResponseServerError { status_code: 409, message: "conflict".into() };
    let err = RuntimeError::from(e);
    assert!(!err.is_not_found());
    assert_eq!(err, RuntimeError::Api { status: 409, message: "conflict".into() });
}

#[test]
fn inspect_response_converts_to_model() {
    let response = ContainerInspectResponse {
        id: Some("abc".into()),
        name: Some("/web".into()),
        image: Some("sha256:1".into()),
        state: Some(ContainerState { running: Some(true), ..Default::default() }),
        config: Some(BollardConfig {
            image: Some("nginx".into()),
            tty: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };
    let details: ContainerDetails = convert(&response).unwrap();
    assert_eq!(details.id, "abc");
    assert_eq!(details.name, "/web");
    assert!(details.state.unwrap().running);
    let config = details.config.unwrap();
    assert_eq!(config.image.as_deref(), Some("nginx"));
    assert_eq!(config.extra["Tty"], serde_json::json!(true));
}

#[test]
fn create_body_nests_host_and_network_config() {
    let mut endpoints = std::collections::BTreeMap::new();
    endpoints.insert("appnet".to_string(), EndpointSettings {
        aliases: Some(vec!["web".into()]),
        ..Default::default()
    });
    let request = CreateRequest {
        name: "web".into(),
        config: ContainerConfig {
            image: Some("nginx:latest".into()),
            env: Some(vec!["A=1".into()]),
            ..Default::default()
        },
        host_config: HostConfig {
            network_mode: Some("appnet".into()),
            links: Some(vec!["db:db".into()]),
            ..Default::default()
        },
        networking: NetworkingConfig { endpoints_config: endpoints },
        platform: None,
    };
    let body = create_body(&request).unwrap();
    assert_eq!(body.image.as_deref(), Some("nginx:latest"));
    assert_eq!(body.env, Some(vec!["A=1".to_string()]));
    let host = body.host_config.unwrap();
    assert_eq!(host.network_mode.as_deref(), Some("appnet"));
    assert_eq!(host.links, Some(vec!["db:db".to_string()]));
    let endpoints = body.networking_config.unwrap().endpoints_config.unwrap();
    assert_eq!(endpoints["appnet"].aliases, Some(vec!["web".to_string()]));
}

#[test]
fn status_filter_omitted_when_empty() {
    assert!(status_filter(&[]).is_empty());
    let filters = status_filter(&[ContainerStatus::Running, ContainerStatus::Exited]);
    assert_eq!(filters["status"], vec!["running", "exited"]);
}

#[test]
fn credentials_carry_server_address() {
    let auth = RegistryAuth {
        username: "u".into(),
        password: "p".into(),
        server: "ghcr.io".into(),
    };
    let creds = credentials(Some(&auth)).unwrap();
    assert_eq!(creds.username.as_deref(), Some("u"));
    assert_eq!(creds.serveraddress.as_deref(), Some("ghcr.io"));
    assert!(credentials(None).is_none());
}
