// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle hooks: label-defined shell commands run inside containers.

use std::time::Duration;
use thiserror::Error;
use wt_adapters::{ExecRequest, RuntimeApi, RuntimeError};
use wt_core::labels::{self, Labels};
use wt_core::{Container, ContainerId};

/// Exit status a pre-update hook uses to postpone the update.
pub const EX_TEMPFAIL: i64 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    PreCheck,
    PostCheck,
    PreUpdate,
    PostUpdate,
}

wt_core::simple_display! {
    Hook {
        PreCheck => "pre-check",
        PostCheck => "post-check",
        PreUpdate => "pre-update",
        PostUpdate => "post-update",
    }
}

impl Hook {
    fn command_label(self) -> &'static str {
        match self {
            Hook::PreCheck => labels::PRE_CHECK,
            Hook::PostCheck => labels::POST_CHECK,
            Hook::PreUpdate => labels::PRE_UPDATE,
            Hook::PostUpdate => labels::POST_UPDATE,
        }
    }

    /// Timeout in minutes; zero is unbounded.
    fn timeout_minutes(self, all: &Labels) -> u64 {
        match self {
            Hook::PreUpdate => labels::timeout_minutes(all, labels::PRE_UPDATE_TIMEOUT),
            Hook::PostUpdate => labels::timeout_minutes(all, labels::POST_UPDATE_TIMEOUT),
            Hook::PreCheck | Hook::PostCheck => labels::DEFAULT_HOOK_TIMEOUT_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Hooks disabled or no command label.
    NotConfigured,
    NotRunning,
    Succeeded,
    /// Exit 75 from the hook.
    TempFail,
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("{hook} hook in {container} exited with {code}")]
    Failed { hook: Hook, container: String, code: i64 },
    #[error("{hook} hook in {container} timed out after {minutes}m")]
    TimedOut { hook: Hook, container: String, minutes: u64 },
    #[error("{hook} hook in {container} could not run: {source}")]
    Exec {
        hook: Hook,
        container: String,
        #[source]
        source: RuntimeError,
    },
}

/// Runs hooks through the runtime's exec API.
#[derive(Clone)]
pub struct HookRunner<R> {
    runtime: R,
    enabled: bool,
}

impl<R: RuntimeApi> HookRunner<R> {
    pub fn new(runtime: R, enabled: bool) -> Self {
        Self { runtime, enabled }
    }

    pub async fn pre_check(&self, container: &Container) -> Result<HookOutcome, HookError> {
        self.run(Hook::PreCheck, container, container.id(), container.is_running()).await
    }

    /// Run in `target`, which is the replacement when the container was
    /// updated this tick.
    pub async fn post_check(
        &self,
        container: &Container,
        target: &ContainerId,
        running: bool,
    ) -> Result<HookOutcome, HookError> {
        self.run(Hook::PostCheck, container, target, running).await
    }

    pub async fn pre_update(&self, container: &Container) -> Result<HookOutcome, HookError> {
        self.run(Hook::PreUpdate, container, container.id(), container.is_running()).await
    }

    /// Run in the replacement `new_id`, using the source container's labels.
    pub async fn post_update(
        &self,
        container: &Container,
        new_id: &ContainerId,
        started: bool,
    ) -> Result<HookOutcome, HookError> {
        self.run(Hook::PostUpdate, container, new_id, started).await
    }

    async fn run(
        &self,
        hook: Hook,
        container: &Container,
        target: &ContainerId,
        running: bool,
    ) -> Result<HookOutcome, HookError> {
        if !self.enabled {
            return Ok(HookOutcome::NotConfigured);
        }
        let Some(command) = container.label(hook.command_label()) else {
            return Ok(HookOutcome::NotConfigured);
        };
        if !running {
            tracing::debug!(container = %container.name(), %hook, "container not running, skipping hook");
            return Ok(HookOutcome::NotRunning);
        }

        let all = container.labels();
        let minutes = hook.timeout_minutes(&all);
        let request = ExecRequest {
            container: target.clone(),
            cmd: vec!["sh".to_string(), "-c".to_string(), command.to_string()],
            user: exec_user(&all),
        };
        tracing::info!(container = %container.name(), %hook, %command, "running lifecycle hook");

        let exec = self.runtime.exec(request);
        let result = if minutes == 0 {
            exec.await
        } else {
            match tokio::time::timeout(Duration::from_secs(minutes * 60), exec).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(HookError::TimedOut {
                        hook,
                        container: container.name().to_string(),
                        minutes,
                    })
                }
            }
        };

        let output = result.map_err(|source| HookError::Exec {
            hook,
            container: container.name().to_string(),
            source,
        })?;
        match output.exit_code {
            0 => Ok(HookOutcome::Succeeded),
            EX_TEMPFAIL if hook == Hook::PreUpdate => Ok(HookOutcome::TempFail),
            code => {
                tracing::debug!(container = %container.name(), %hook, output = %output.output, "hook output");
                Err(HookError::Failed { hook, container: container.name().to_string(), code })
            }
        }
    }
}

/// `uid` or `uid:gid` from the lifecycle labels, when valid.
pub(crate) fn exec_user(all: &Labels) -> Option<String> {
    let uid = labels::id_label(all, labels::LIFECYCLE_UID);
    let gid = labels::id_label(all, labels::LIFECYCLE_GID);
    match (uid, gid) {
        (Some(uid), Some(gid)) => Some(format!("{}:{}", uid, gid)),
        (Some(uid), None) => Some(uid.to_string()),
        (None, _) => None,
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
