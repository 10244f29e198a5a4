// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker Engine API client.
//!
//! Responses are converted into the core model through their shared JSON
//! shape, so fields the reconciler never reads still survive a recreate.

use super::{
    ContainerStatus, CreateRequest, ExecOutput, ExecRequest, RemoveOptions, RuntimeApi,
    RuntimeError,
};
use crate::registry::RegistryAuth;
use async_trait::async_trait;
use bollard::auth::DockerCredentials;
use bollard::errors::Error as BollardError;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{ContainerCreateBody, ExecConfig, NetworkConnectRequest};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, InspectContainerOptions,
    ListContainersOptionsBuilder, RemoveContainerOptionsBuilder, RemoveImageOptionsBuilder,
    RenameContainerOptionsBuilder, StartContainerOptions, StopContainerOptionsBuilder,
};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wt_core::{
    ApiVersion, ContainerDetails, ContainerId, EndpointSettings, ImageDetails, ImageId,
};

const CONNECT_TIMEOUT_SECS: u64 = 120;

impl From<BollardError> for RuntimeError {
    fn from(e: BollardError) -> Self {
        match e {
            BollardError::DockerResponseServerError { status_code: 404, message } => {
                RuntimeError::NotFound(message)
            }
            BollardError::DockerResponseServerError { status_code, message } => {
                RuntimeError::Api { status: status_code, message }
            }
            other => RuntimeError::Transport(other.to_string()),
        }
    }
}

/// Runtime backed by a long-lived bollard client.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
    api: ApiVersion,
    podman: bool,
}

impl DockerRuntime {
    /// Connect to `host`, or to `DOCKER_HOST`/the local socket when unset,
    /// and negotiate the API version.
    pub async fn connect(host: Option<&str>) -> Result<Self, RuntimeError> {
        let docker = match host {
            Some(h) if h.starts_with("tcp://") || h.starts_with("http://") => {
                Docker::connect_with_http(h, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
            Some(h) => Docker::connect_with_socket(h, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?,
            None => Docker::connect_with_defaults()?,
        };
        let docker = docker.negotiate_version().await?;
        let client = docker.client_version();
        let api = ApiVersion::new(client.major_version as u32, client.minor_version as u32);

        let version = docker.version().await?;
        let podman = version
            .components
            .unwrap_or_default()
            .iter()
            .any(|c| c.name.to_ascii_lowercase().contains("podman"));

        tracing::info!(
            api = %api,
            server = version.version.as_deref().unwrap_or("unknown"),
            podman,
            "connected to container runtime"
        );
        Ok(Self { docker, api, podman })
    }
}

/// Re-shape a value between two types that share the Engine API JSON form.
pub(crate) fn convert<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U, RuntimeError> {
    let json = serde_json::to_value(value).map_err(|e| RuntimeError::Decode(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| RuntimeError::Decode(e.to_string()))
}

/// Build the create body: config fields at the top level, host and network
/// config nested.
pub(crate) fn create_body(request: &CreateRequest) -> Result<ContainerCreateBody, RuntimeError> {
    let mut body = match serde_json::to_value(&request.config) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => serde_json::Map::new(),
        Err(e) => return Err(RuntimeError::Decode(e.to_string())),
    };
    let host = serde_json::to_value(&request.host_config)
        .map_err(|e| RuntimeError::Decode(e.to_string()))?;
    let networking = serde_json::to_value(&request.networking)
        .map_err(|e| RuntimeError::Decode(e.to_string()))?;
    body.insert("HostConfig".to_string(), host);
    body.insert("NetworkingConfig".to_string(), networking);
    serde_json::from_value(serde_json::Value::Object(body))
        .map_err(|e| RuntimeError::Decode(e.to_string()))
}

pub(crate) fn status_filter(statuses: &[ContainerStatus]) -> HashMap<String, Vec<String>> {
    let mut filters = HashMap::new();
    if !statuses.is_empty() {
        filters.insert("status".to_string(), statuses.iter().map(|s| s.to_string()).collect());
    }
    filters
}

fn credentials(auth: Option<&RegistryAuth>) -> Option<DockerCredentials> {
    auth.map(|a| DockerCredentials {
        username: Some(a.username.clone()),
        password: Some(a.password.clone()),
        serveraddress: Some(a.server.clone()),
        ..Default::default()
    })
}

#[async_trait]
impl RuntimeApi for DockerRuntime {
    fn api_version(&self) -> ApiVersion {
        self.api
    }

    fn is_podman(&self) -> bool {
        self.podman
    }

    async fn list_containers(
        &self,
        statuses: &[ContainerStatus],
    ) -> Result<Vec<ContainerId>, RuntimeError> {
        let options =
            ListContainersOptionsBuilder::new().all(true).filters(&status_filter(statuses)).build();
        let summaries = self.docker.list_containers(Some(options)).await?;
        Ok(summaries.into_iter().filter_map(|s| s.id).map(ContainerId::new).collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let response = self.docker.inspect_container(id, None::<InspectContainerOptions>).await?;
        convert(&response)
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError> {
        let response = self.docker.inspect_image(reference).await?;
        convert(&response)
    }

    async fn pull_image(
        &self,
        reference: &str,
        auth: Option<&RegistryAuth>,
        cancel: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let options = CreateImageOptionsBuilder::new().from_image(reference).build();
        let stream = self.docker.create_image(Some(options), None, credentials(auth));
        tokio::pin!(stream);
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
                item = stream.next() => item,
            };
            match item {
                None => return Ok(()),
                Some(Ok(info)) => {
                    if let Some(error) = info.error {
                        return Err(RuntimeError::Pull { image: reference.to_string(), message: error });
                    }
                    if let Some(status) = info.status {
                        tracing::trace!(image = reference, %status, "pull progress");
                    }
                }
                Some(Err(e)) => {
                    return Err(match RuntimeError::from(e) {
                        RuntimeError::NotFound(m) => RuntimeError::NotFound(m),
                        other => RuntimeError::Pull {
                            image: reference.to_string(),
                            message: other.to_string(),
                        },
                    })
                }
            }
        }
    }

    async fn create_container(&self, request: CreateRequest) -> Result<ContainerId, RuntimeError> {
        let mut options = CreateContainerOptionsBuilder::new().name(&request.name);
        if let Some(platform) = request.platform.as_deref() {
            options = options.platform(platform);
        }
        let body = create_body(&request)?;
        let response = self.docker.create_container(Some(options.build()), body).await?;
        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        self.docker.start_container(id, None::<StartContainerOptions>).await?;
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        signal: &str,
        timeout: Duration,
    ) -> Result<(), RuntimeError> {
        let secs = i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX);
        let options = StopContainerOptionsBuilder::new().signal(signal).t(secs).build();
        match self.docker.stop_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            // Already stopped
            Err(BollardError::DockerResponseServerError { status_code: 304, .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptionsBuilder::new()
            .force(options.force)
            .v(options.remove_volumes)
            .build();
        self.docker.remove_container(id, Some(options)).await?;
        Ok(())
    }

    async fn rename_container(&self, id: &ContainerId, new_name: &str) -> Result<(), RuntimeError> {
        let options = RenameContainerOptionsBuilder::new().name(new_name).build();
        self.docker.rename_container(id, options).await?;
        Ok(())
    }

    async fn connect_network(
        &self,
        network: &str,
        id: &ContainerId,
        endpoint: EndpointSettings,
    ) -> Result<(), RuntimeError> {
        let request = NetworkConnectRequest {
            container: Some(id.to_string()),
            endpoint_config: Some(convert(&endpoint)?),
        };
        self.docker.connect_network(network, request).await?;
        Ok(())
    }

    async fn remove_image(&self, id: &ImageId) -> Result<(), RuntimeError> {
        let options = RemoveImageOptionsBuilder::new().force(false).build();
        self.docker.remove_image(id, Some(options), None).await?;
        Ok(())
    }

    async fn exec(&self, request: ExecRequest) -> Result<ExecOutput, RuntimeError> {
        let config = ExecConfig {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(request.cmd),
            user: request.user,
            ..Default::default()
        };
        let created = self.docker.create_exec(&request.container, config).await?;
        let mut output = String::new();
        if let StartExecResults::Attached { output: mut stream, .. } =
            self.docker.start_exec(&created.id, None::<StartExecOptions>).await?
        {
            while let Some(chunk) = stream.next().await {
                output.push_str(&chunk?.to_string());
            }
        }
        let inspect = self.docker.inspect_exec(&created.id).await?;
        Ok(ExecOutput { exit_code: inspect.exit_code.unwrap_or_default(), output })
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
