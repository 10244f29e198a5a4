// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry credential resolution for image pulls.
//!
//! Credentials are looked up per image at pull time:
//!
//! ```text
//! 1. REPO_USER + REPO_PASS env vars (any registry)
//! 2. $DOCKER_CONFIG/config.json → auths.<host>.{username,password}
//! 3. ~/.docker/config.json      → auths.<host>.{username,password}
//! ```
//!
//! Entries holding only an encoded `auth` blob or a credential helper are
//! ignored; the pull then goes out anonymously.

use std::path::{Path, PathBuf};

/// Registry host used for unqualified image names.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Credentials for one registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    pub server: String,
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

/// Registry host of an image reference (`ghcr.io/a/b:1` → `ghcr.io`).
pub fn registry_host(image: &str) -> String {
    let Some((first, _)) = image.split_once('/') else {
        return DEFAULT_REGISTRY.to_string();
    };
    if first.contains('.') || first.contains(':') || first == "localhost" {
        normalize_host(first)
    } else {
        DEFAULT_REGISTRY.to_string()
    }
}

/// Strip scheme and path from a config key and fold Docker Hub aliases.
fn normalize_host(key: &str) -> String {
    let key = key.strip_prefix("https://").or_else(|| key.strip_prefix("http://")).unwrap_or(key);
    let host = key.split('/').next().unwrap_or(key);
    match host {
        "index.docker.io" | "registry-1.docker.io" => DEFAULT_REGISTRY.to_string(),
        other => other.to_string(),
    }
}

/// Resolve credentials for pulling `image`.
///
/// Returns `None` when nothing applies; the pull is then anonymous.
pub fn resolve(image: &str) -> Option<RegistryAuth> {
    let host = registry_host(image);
    if let Some(auth) = from_env(&host) {
        return Some(auth);
    }
    let path = config_path()?;
    let auth = from_config_file(&path, &host);
    if auth.is_some() {
        tracing::debug!(registry = %host, path = %path.display(), "using docker config credentials");
    }
    auth
}

fn from_env(host: &str) -> Option<RegistryAuth> {
    let username = std::env::var("REPO_USER").ok().filter(|s| !s.is_empty())?;
    let password = std::env::var("REPO_PASS").ok().filter(|s| !s.is_empty())?;
    Some(RegistryAuth { username, password, server: host.to_string() })
}

/// Read `auths.<host>` username/password from a Docker client config file.
pub(crate) fn from_config_file(path: &Path, host: &str) -> Option<RegistryAuth> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;
    let auths = value.get("auths")?.as_object()?;
    let entry = auths.iter().find(|(key, _)| normalize_host(key) == host).map(|(_, v)| v)?;
    let field = |name: &str| {
        entry.get(name).and_then(|v| v.as_str()).filter(|s| !s.is_empty()).map(|s| s.to_string())
    };
    Some(RegistryAuth {
        username: field("username")?,
        password: field("password")?,
        server: host.to_string(),
    })
}

/// `$DOCKER_CONFIG/config.json`, else `~/.docker/config.json`.
fn config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("DOCKER_CONFIG").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir).join("config.json"));
    }
    dirs::home_dir().map(|home| home.join(".docker").join("config.json"))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
