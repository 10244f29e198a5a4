// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runtime API.
//!
//! # Module layout
//!
//! - [`docker`]: Engine API client over bollard
//! - `fake`: in-memory host for tests (feature `test-support`)
//!
//! Results are expressed in `wt-core` model types so nothing above this
//! layer depends on the transport.

mod docker;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use docker::DockerRuntime;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FailOp, FakeRuntime, RuntimeCall};

use crate::registry::RegistryAuth;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use wt_core::{
    ApiVersion, ContainerConfig, ContainerDetails, ContainerId, EndpointSettings, HostConfig,
    ImageDetails, ImageId, NetworkingConfig,
};

/// Errors from runtime API calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("runtime API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("runtime connection failed: {0}")]
    Transport(String),
    #[error("pulling {image} failed: {message}")]
    Pull { image: String, message: String },
    #[error("malformed runtime payload: {0}")]
    Decode(String),
    #[error("cancelled")]
    Cancelled,
}

impl RuntimeError {
    /// Whether the object the call referred to does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}

/// Container states accepted by the list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    Created,
    Running,
    Restarting,
    Exited,
    Paused,
    Dead,
}

wt_core::simple_display! {
    ContainerStatus {
        Created => "created",
        Running => "running",
        Restarting => "restarting",
        Exited => "exited",
        Paused => "paused",
        Dead => "dead",
    }
}

/// Payload of a create call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    pub name: String,
    pub config: ContainerConfig,
    pub host_config: HostConfig,
    pub networking: NetworkingConfig,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    pub force: bool,
    pub remove_volumes: bool,
}

/// Command to run inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub container: ContainerId,
    pub cmd: Vec<String>,
    /// `uid` or `uid:gid`
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

/// The runtime surface the agent consumes.
#[async_trait]
pub trait RuntimeApi: Clone + Send + Sync + 'static {
    /// Negotiated Engine API version.
    fn api_version(&self) -> ApiVersion;

    /// Whether the daemon is Podman, which has no `restarting` state.
    fn is_podman(&self) -> bool;

    /// IDs of containers in any of `statuses`; every container when empty.
    async fn list_containers(
        &self,
        statuses: &[ContainerStatus],
    ) -> Result<Vec<ContainerId>, RuntimeError>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError>;

    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError>;

    /// Pull `reference`, aborting with [`RuntimeError::Cancelled`] when
    /// `cancel` fires.
    async fn pull_image(
        &self,
        reference: &str,
        auth: Option<&RegistryAuth>,
        cancel: &CancellationToken,
    ) -> Result<(), RuntimeError>;

    async fn create_container(&self, request: CreateRequest) -> Result<ContainerId, RuntimeError>;

    async fn start_container(&self, id: &ContainerId) -> Result<(), RuntimeError>;

    /// Send `signal`, then kill after `timeout`.
    async fn stop_container(
        &self,
        id: &ContainerId,
        signal: &str,
        timeout: Duration,
    ) -> Result<(), RuntimeError>;

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), RuntimeError>;

    async fn rename_container(&self, id: &ContainerId, new_name: &str) -> Result<(), RuntimeError>;

    async fn connect_network(
        &self,
        network: &str,
        id: &ContainerId,
        endpoint: EndpointSettings,
    ) -> Result<(), RuntimeError>;

    async fn remove_image(&self, id: &ImageId) -> Result<(), RuntimeError>;

    async fn exec(&self, request: ExecRequest) -> Result<ExecOutput, RuntimeError>;
}
