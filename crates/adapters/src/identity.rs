// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detection of the agent's own container id.
//!
//! Strategies, first match wins:
//!
//! ```text
//! 1. /proc/self/mountinfo → root field containing /containers/<64-hex>
//! 2. /proc/<pid>/cgroup   → line N:<controllers>:/docker/<64-hex>
//! 3. runtime listing      → container whose Config.Hostname == $HOSTNAME
//! ```

use crate::runtime::{RuntimeApi, RuntimeError};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;
use wt_core::ContainerId;

#[allow(clippy::expect_used)]
static MOUNTINFO_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/containers/([0-9a-f]{64})(?:[^0-9a-f]|$)")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static CGROUP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+:[^:]*:/docker/([0-9a-f]{64})(?:[^0-9a-f]|$)")
        .expect("constant regex pattern is valid")
});

/// Errors from self-identity detection
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no container id in {0}")]
    NoMatch(PathBuf),
    #[error("HOSTNAME is not set")]
    NoHostname,
    #[error("no container has hostname {0}")]
    HostnameNotFound(String),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("own container id could not be determined")]
    Unknown,
}

/// Resolves the id of the container the agent runs in.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    proc_root: PathBuf,
    pid: u32,
    hostname: Option<String>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            pid: std::process::id(),
            hostname: std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()),
        }
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    wt_core::setters! {
        into { proc_root: PathBuf }
        set { pid: u32 }
        option { hostname: String }
    }

    /// Run every strategy in order.
    pub async fn detect<R: RuntimeApi>(&self, runtime: &R) -> Result<ContainerId, IdentityError> {
        match self.from_mountinfo() {
            Ok(id) => return Ok(id),
            Err(e) => tracing::debug!(error = %e, "self id not found in mountinfo"),
        }
        match self.from_cgroup() {
            Ok(id) => return Ok(id),
            Err(e) => tracing::debug!(error = %e, "self id not found in cgroup"),
        }
        match self.from_hostname(runtime).await {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::debug!(error = %e, "self id not found by hostname");
                Err(IdentityError::Unknown)
            }
        }
    }

    pub fn from_mountinfo(&self) -> Result<ContainerId, IdentityError> {
        let path = self.proc_root.join("self").join("mountinfo");
        let content = read(&path)?;
        parse_mountinfo(&content).map(ContainerId::new).ok_or(IdentityError::NoMatch(path))
    }

    pub fn from_cgroup(&self) -> Result<ContainerId, IdentityError> {
        let path = self.proc_root.join(self.pid.to_string()).join("cgroup");
        let content = read(&path)?;
        parse_cgroup(&content).map(ContainerId::new).ok_or(IdentityError::NoMatch(path))
    }

    pub async fn from_hostname<R: RuntimeApi>(
        &self,
        runtime: &R,
    ) -> Result<ContainerId, IdentityError> {
        let hostname = self.hostname.as_deref().ok_or(IdentityError::NoHostname)?;
        for id in runtime.list_containers(&[]).await? {
            let details = match runtime.inspect_container(&id).await {
                Ok(d) => d,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            let matches =
                details.config.as_ref().and_then(|c| c.hostname.as_deref()) == Some(hostname);
            if matches {
                return Ok(id);
            }
        }
        Err(IdentityError::HostnameNotFound(hostname.to_string()))
    }
}

fn read(path: &std::path::Path) -> Result<String, IdentityError> {
    std::fs::read_to_string(path)
        .map_err(|source| IdentityError::Read { path: path.to_path_buf(), source })
}

/// Container id from the root field (4th column) of any mountinfo line.
pub(crate) fn parse_mountinfo(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let root = line.split_whitespace().nth(3)?;
        MOUNTINFO_ROOT.captures(root).map(|c| c[1].to_string())
    })
}

pub(crate) fn parse_cgroup(content: &str) -> Option<String> {
    content.lines().find_map(|line| CGROUP_LINE.captures(line).map(|c| c[1].to_string()))
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
