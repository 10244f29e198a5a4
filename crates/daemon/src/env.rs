// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

/// Host name used in notification titles: HOSTNAME > /etc/hostname > "localhost"
pub fn hostname() -> String {
    if let Some(name) = std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()) {
        return name;
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
