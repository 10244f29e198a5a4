// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime identifiers and name normalisation

/// Length of the short form of a container ID, as printed by `docker ps`.
pub const SHORT_ID_LEN: usize = 12;

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Strip the leading `/` the runtime puts on container names.
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

crate::define_id! {
    /// Container ID assigned by the runtime (64 hex characters).
    pub struct ContainerId;
}

impl ContainerId {
    /// The 12-character form used in logs and network aliases.
    pub fn short(&self) -> &str {
        short(&self.0, SHORT_ID_LEN)
    }
}

crate::define_id! {
    /// Image ID, usually a content digest prefixed with `sha256:`.
    pub struct ImageId;
}

impl ImageId {
    /// Short form with the digest algorithm stripped.
    pub fn short(&self) -> &str {
        let digest = self.0.strip_prefix("sha256:").unwrap_or(&self.0);
        short(digest, SHORT_ID_LEN)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
