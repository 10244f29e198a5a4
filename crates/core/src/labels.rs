// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recognised container labels and their value parsers.

use std::collections::HashMap;

pub const ENABLE: &str = "com.centurylinklabs.watchtower.enable";
/// Marks the container running the agent itself.
pub const SELF_MARKER: &str = "com.centurylinklabs.watchtower";
pub const SCOPE: &str = "com.centurylinklabs.watchtower.scope";
pub const MONITOR_ONLY: &str = "com.centurylinklabs.watchtower.monitor-only";
pub const NO_PULL: &str = "com.centurylinklabs.watchtower.no-pull";
pub const DEPENDS_ON: &str = "com.centurylinklabs.watchtower.depends-on";
pub const STOP_SIGNAL: &str = "com.centurylinklabs.watchtower.stop-signal";
pub const STOP_TIMEOUT: &str = "com.centurylinklabs.watchtower.stop-timeout";
pub const PRE_CHECK: &str = "com.centurylinklabs.watchtower.lifecycle.pre-check";
pub const POST_CHECK: &str = "com.centurylinklabs.watchtower.lifecycle.post-check";
pub const PRE_UPDATE: &str = "com.centurylinklabs.watchtower.lifecycle.pre-update";
pub const POST_UPDATE: &str = "com.centurylinklabs.watchtower.lifecycle.post-update";
pub const PRE_UPDATE_TIMEOUT: &str = "com.centurylinklabs.watchtower.lifecycle.pre-update-timeout";
pub const POST_UPDATE_TIMEOUT: &str =
    "com.centurylinklabs.watchtower.lifecycle.post-update-timeout";
pub const LIFECYCLE_UID: &str = "com.centurylinklabs.watchtower.lifecycle.uid";
pub const LIFECYCLE_GID: &str = "com.centurylinklabs.watchtower.lifecycle.gid";
pub const ZODIAC_ORIGINAL_IMAGE: &str = "com.centurylinklabs.watchtower.zodiac.original-image";
pub const CONTAINER_CHAIN: &str = "com.centurylinklabs.watchtower.container-chain";

pub const COMPOSE_PROJECT: &str = "com.docker.compose.project";
pub const COMPOSE_SERVICE: &str = "com.docker.compose.service";
pub const COMPOSE_CONTAINER_NUMBER: &str = "com.docker.compose.container-number";
pub const COMPOSE_DEPENDS_ON: &str = "com.docker.compose.depends_on";

/// Explicit scope bucket, distinct from "no scope".
pub const SCOPE_NONE: &str = "none";

/// Default lifecycle hook timeout when the label is absent or unparseable.
pub const DEFAULT_HOOK_TIMEOUT_MINUTES: u64 = 1;

/// Label map as carried on runtime configs.
pub type Labels = HashMap<String, String>;

/// Parse a boolean label value the way Go's `strconv.ParseBool` does.
///
/// Returns `None` for anything unrecognised so callers can fall back to a
/// global default.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Look up a label and parse it as a boolean.
pub fn bool_label(labels: &Labels, key: &str) -> Option<bool> {
    labels.get(key).and_then(|v| parse_bool(v))
}

/// Hook timeout in minutes. Invalid values fall back to one minute;
/// zero means unbounded and is returned as-is.
pub fn timeout_minutes(labels: &Labels, key: &str) -> u64 {
    match labels.get(key) {
        None => DEFAULT_HOOK_TIMEOUT_MINUTES,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(m) if m >= 0 => m as u64,
            _ => DEFAULT_HOOK_TIMEOUT_MINUTES,
        },
    }
}

/// Numeric uid/gid label. Negative or out of `u32` range yields `None`.
pub fn id_label(labels: &Labels, key: &str) -> Option<u32> {
    let raw = labels.get(key)?;
    let value = raw.trim().parse::<i64>().ok()?;
    u32::try_from(value).ok()
}

/// Split a comma-separated label into trimmed, non-empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Non-empty label value, or `None`.
pub fn non_empty<'a>(labels: &'a Labels, key: &str) -> Option<&'a str> {
    labels.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
