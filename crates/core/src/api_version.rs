// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime API version comparison.

use std::fmt;

/// A `major.minor` Engine API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    /// First API version that accepts per-endpoint MAC addresses, IP
    /// addresses and DNS names in the create payload, and more than one
    /// endpoint at create time.
    pub const ENDPOINT_SETTINGS: ApiVersion = ApiVersion::new(1, 44);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `"1.44"` or `"v1.44"`. Missing minor is read as zero.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);
        let mut parts = s.splitn(2, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(m) => m.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }

    /// Whether this version predates [`ApiVersion::ENDPOINT_SETTINGS`].
    pub fn is_legacy(self) -> bool {
        self < Self::ENDPOINT_SETTINGS
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::ENDPOINT_SETTINGS
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
#[path = "api_version_tests.rs"]
mod tests;
