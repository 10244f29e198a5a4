// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory runtime host for tests.

use super::{
    ContainerStatus, CreateRequest, ExecOutput, ExecRequest, RemoveOptions, RuntimeApi,
    RuntimeError,
};
use crate::registry::RegistryAuth;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wt_core::model::{ContainerState, NetworkSettings};
use wt_core::test_support::{fake_id, ContainerBuilder};
use wt_core::{
    normalize_name, ApiVersion, ContainerDetails, ContainerId, EndpointSettings, ImageDetails,
    ImageId,
};

/// Recorded runtime call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    List,
    Inspect(String),
    InspectImage(String),
    Pull(String),
    Create { name: String, image: String },
    Start(String),
    Stop { name: String, signal: String, timeout: Duration },
    Remove { name: String, force: bool, remove_volumes: bool },
    Rename { from: String, to: String },
    ConnectNetwork { network: String, name: String },
    RemoveImage(String),
    Exec { name: String, cmd: Vec<String>, user: Option<String> },
}

impl RuntimeCall {
    /// Whether the call changes host state.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            RuntimeCall::List
                | RuntimeCall::Inspect(_)
                | RuntimeCall::InspectImage(_)
                | RuntimeCall::Pull(_)
                | RuntimeCall::Exec { .. }
        )
    }

    /// Compact form such as `stop(web)` for asserting call order.
    pub fn short(&self) -> String {
        match self {
            RuntimeCall::List => "list".to_string(),
            RuntimeCall::Inspect(n) => format!("inspect({})", n),
            RuntimeCall::InspectImage(r) => format!("inspect_image({})", r),
            RuntimeCall::Pull(r) => format!("pull({})", r),
            RuntimeCall::Create { name, .. } => format!("create({})", name),
            RuntimeCall::Start(n) => format!("start({})", n),
            RuntimeCall::Stop { name, .. } => format!("stop({})", name),
            RuntimeCall::Remove { name, .. } => format!("remove({})", name),
            RuntimeCall::Rename { from, to } => format!("rename({}->{})", from, to),
            RuntimeCall::ConnectNetwork { network, name } => format!("connect({},{})", network, name),
            RuntimeCall::RemoveImage(id) => format!("remove_image({})", id),
            RuntimeCall::Exec { name, .. } => format!("exec({})", name),
        }
    }
}

/// Operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOp {
    Inspect,
    InspectImage,
    Pull,
    Create,
    Start,
    Stop,
    Remove,
    Rename,
    Exec,
}

struct FakeState {
    containers: Vec<ContainerDetails>,
    /// Keyed by reference and by id.
    images: HashMap<String, ImageDetails>,
    pull_results: HashMap<String, ImageDetails>,
    failures: HashMap<(FailOp, String), RuntimeError>,
    list_error: Option<RuntimeError>,
    exec_exits: HashMap<String, i64>,
    exec_delay: Option<Duration>,
    calls: Vec<RuntimeCall>,
    api: ApiVersion,
    podman: bool,
    created: u64,
}

/// Fake runtime that keeps an in-memory host and records every call
#[derive(Clone)]
pub struct FakeRuntime {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                containers: Vec::new(),
                images: HashMap::new(),
                pull_results: HashMap::new(),
                failures: HashMap::new(),
                list_error: None,
                exec_exits: HashMap::new(),
                exec_delay: None,
                calls: Vec::new(),
                api: ApiVersion::ENDPOINT_SETTINGS,
                podman: false,
                created: 0,
            })),
        }
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container and its image to the host.
    pub fn add(&self, builder: &ContainerBuilder) {
        let details = builder.details();
        let mut state = self.inner.lock();
        if let Some(image) = builder.image_details() {
            if let Some(reference) = details.config.as_ref().and_then(|c| c.image.clone()) {
                state.images.insert(with_tag(&reference), image.clone());
            }
            state.images.insert(image.id.clone(), image);
        }
        state.containers.push(details);
    }

    /// Make the next pull of `reference` resolve it to a new image id.
    pub fn set_pull_result(&self, reference: &str, image_id: &str) {
        let mut state = self.inner.lock();
        let config = state.images.get(reference).and_then(|i| i.config.clone());
        state.pull_results.insert(
            reference.to_string(),
            ImageDetails { id: image_id.to_string(), config, ..Default::default() },
        );
    }

    /// Fail `op` on the container (or image reference) named `target`.
    pub fn fail(&self, op: FailOp, target: &str, error: RuntimeError) {
        self.inner.lock().failures.insert((op, target.to_string()), error);
    }

    pub fn fail_list(&self, error: RuntimeError) {
        self.inner.lock().list_error = Some(error);
    }

    /// Exit code of hooks run in `name`.
    pub fn set_exec_exit(&self, name: &str, code: i64) {
        self.inner.lock().exec_exits.insert(name.to_string(), code);
    }

    pub fn set_exec_delay(&self, delay: Duration) {
        self.inner.lock().exec_delay = Some(delay);
    }

    pub fn set_api_version(&self, api: ApiVersion) {
        self.inner.lock().api = api;
    }

    pub fn set_podman(&self, podman: bool) {
        self.inner.lock().podman = podman;
    }

    /// Remove a container behind the agent's back.
    pub fn remove_silently(&self, name: &str) {
        self.inner.lock().containers.retain(|c| normalize_name(&c.name) != name);
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.inner.lock().calls.clone()
    }

    /// Write calls in [`RuntimeCall::short`] form.
    pub fn writes(&self) -> Vec<String> {
        self.inner.lock().calls.iter().filter(|c| c.is_write()).map(RuntimeCall::short).collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn container(&self, name: &str) -> Option<ContainerDetails> {
        self.inner.lock().containers.iter().find(|c| normalize_name(&c.name) == name).cloned()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.inner.lock().containers.iter().map(|c| normalize_name(&c.name).to_string()).collect()
    }

    /// Current image id for `reference`.
    pub fn image_id(&self, reference: &str) -> Option<String> {
        self.inner.lock().images.get(reference).map(|i| i.id.clone())
    }
}

fn with_tag(reference: &str) -> String {
    if reference.contains(':') {
        reference.to_string()
    } else {
        format!("{}:latest", reference)
    }
}

impl FakeState {
    fn position(&self, key: &str) -> Option<usize> {
        let key_name = normalize_name(key);
        self.containers.iter().position(|c| c.id == key || normalize_name(&c.name) == key_name)
    }

    fn name_of(&self, key: &str) -> String {
        self.position(key)
            .map(|i| normalize_name(&self.containers[i].name).to_string())
            .unwrap_or_else(|| key.to_string())
    }

    fn check(&self, op: FailOp, target: &str) -> Result<(), RuntimeError> {
        match self.failures.get(&(op, target.to_string())) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn find(&self, key: &str) -> Result<usize, RuntimeError> {
        self.position(key).ok_or_else(|| RuntimeError::NotFound(format!("no such container: {}", key)))
    }

    fn set_state(&mut self, index: usize, status: &str, running: bool) {
        let state = self.containers[index].state.get_or_insert_with(ContainerState::default);
        state.status = status.to_string();
        state.running = running;
        state.restarting = false;
    }
}

fn status_of(details: &ContainerDetails) -> Option<&str> {
    details.state.as_ref().map(|s| s.status.as_str())
}

#[async_trait]
impl RuntimeApi for FakeRuntime {
    fn api_version(&self) -> ApiVersion {
        self.inner.lock().api
    }

    fn is_podman(&self) -> bool {
        self.inner.lock().podman
    }

    async fn list_containers(
        &self,
        statuses: &[ContainerStatus],
    ) -> Result<Vec<ContainerId>, RuntimeError> {
        let mut state = self.inner.lock();
        state.calls.push(RuntimeCall::List);
        if let Some(e) = state.list_error.clone() {
            return Err(e);
        }
        let wanted: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        Ok(state
            .containers
            .iter()
            .filter(|c| wanted.is_empty() || status_of(c).is_some_and(|s| wanted.iter().any(|w| w == s)))
            .map(|c| ContainerId::new(c.id.clone()))
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let mut state = self.inner.lock();
        let name = state.name_of(id);
        state.calls.push(RuntimeCall::Inspect(name.clone()));
        state.check(FailOp::Inspect, &name)?;
        let index = state.find(id)?;
        Ok(state.containers[index].clone())
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageDetails, RuntimeError> {
        let mut state = self.inner.lock();
        state.calls.push(RuntimeCall::InspectImage(reference.to_string()));
        state.check(FailOp::InspectImage, reference)?;
        state
            .images
            .get(reference)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(format!("no such image: {}", reference)))
    }

    async fn pull_image(
        &self,
        reference: &str,
        _auth: Option<&RegistryAuth>,
        cancel: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        state.calls.push(RuntimeCall::Pull(reference.to_string()));
        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        state.check(FailOp::Pull, reference)?;
        if let Some(image) = state.pull_results.remove(reference) {
            state.images.insert(image.id.clone(), image.clone());
            state.images.insert(reference.to_string(), image);
        }
        Ok(())
    }

    async fn create_container(&self, request: CreateRequest) -> Result<ContainerId, RuntimeError> {
        let mut state = self.inner.lock();
        let image = request.config.image.clone().unwrap_or_default();
        state.calls.push(RuntimeCall::Create { name: request.name.clone(), image: image.clone() });
        state.check(FailOp::Create, &request.name)?;
        if state.position(&request.name).is_some() {
            return Err(RuntimeError::Api {
                status: 409,
                message: format!("name {} is already in use", request.name),
            });
        }

        state.created += 1;
        let id = fake_id(&format!("{}#{}", request.name, state.created));
        let image_id = state.images.get(&image).map(|i| i.id.clone()).unwrap_or_default();
        let networks = request
            .networking
            .endpoints_config
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();
        state.containers.push(ContainerDetails {
            id: id.clone(),
            name: format!("/{}", request.name),
            image: image_id,
            state: Some(ContainerState { status: "created".to_string(), ..Default::default() }),
            config: Some(request.config),
            host_config: Some(request.host_config),
            network_settings: Some(NetworkSettings { networks, ..Default::default() }),
            ..Default::default()
        });
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        let name = state.name_of(id);
        state.calls.push(RuntimeCall::Start(name.clone()));
        state.check(FailOp::Start, &name)?;
        let index = state.find(id)?;
        state.set_state(index, "running", true);
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        signal: &str,
        timeout: Duration,
    ) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        let name = state.name_of(id);
        state.calls.push(RuntimeCall::Stop {
            name: name.clone(),
            signal: signal.to_string(),
            timeout,
        });
        state.check(FailOp::Stop, &name)?;
        let index = state.find(id)?;
        state.set_state(index, "exited", false);
        Ok(())
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        options: RemoveOptions,
    ) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        let name = state.name_of(id);
        state.calls.push(RuntimeCall::Remove {
            name: name.clone(),
            force: options.force,
            remove_volumes: options.remove_volumes,
        });
        state.check(FailOp::Remove, &name)?;
        let index = state.find(id)?;
        state.containers.remove(index);
        Ok(())
    }

    async fn rename_container(&self, id: &ContainerId, new_name: &str) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        let name = state.name_of(id);
        state.calls.push(RuntimeCall::Rename { from: name.clone(), to: new_name.to_string() });
        state.check(FailOp::Rename, &name)?;
        let index = state.find(id)?;
        state.containers[index].name = format!("/{}", new_name);
        Ok(())
    }

    async fn connect_network(
        &self,
        network: &str,
        id: &ContainerId,
        endpoint: EndpointSettings,
    ) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        let name = state.name_of(id);
        state.calls.push(RuntimeCall::ConnectNetwork { network: network.to_string(), name });
        let index = state.find(id)?;
        state.containers[index]
            .network_settings
            .get_or_insert_with(NetworkSettings::default)
            .networks
            .insert(network.to_string(), Some(endpoint));
        Ok(())
    }

    async fn remove_image(&self, id: &ImageId) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        state.calls.push(RuntimeCall::RemoveImage(id.to_string()));
        if state.images.remove(id.as_str()).is_none() {
            return Err(RuntimeError::NotFound(format!("no such image: {}", id)));
        }
        Ok(())
    }

    async fn exec(&self, request: ExecRequest) -> Result<ExecOutput, RuntimeError> {
        let (delay, result) = {
            let mut state = self.inner.lock();
            let name = state.name_of(&request.container);
            state.calls.push(RuntimeCall::Exec {
                name: name.clone(),
                cmd: request.cmd.clone(),
                user: request.user.clone(),
            });
            let result = state.check(FailOp::Exec, &name).and_then(|()| {
                state.find(&request.container)?;
                Ok(ExecOutput {
                    exit_code: state.exec_exits.get(&name).copied().unwrap_or(0),
                    output: String::new(),
                })
            });
            (state.exec_delay, result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
