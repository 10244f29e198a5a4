// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Which containers the agent acts on.

use crate::container::Container;
use crate::id::{normalize_name, ContainerId};
use crate::labels::SCOPE_NONE;

/// Whether a container's scope label falls inside the configured scope.
///
/// An unset or empty configured scope only matches unscoped containers;
/// `"none"` is an explicit bucket of its own; anything else is exact.
pub fn scope_matches(configured: Option<&str>, label: Option<&str>) -> bool {
    let label = label.filter(|l| !l.is_empty());
    match configured.filter(|s| !s.is_empty()) {
        None => label.is_none(),
        Some(SCOPE_NONE) => label == Some(SCOPE_NONE),
        Some(scope) => label == Some(scope),
    }
}

/// Predicate applied to every listed container.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilter {
    pub scope: Option<String>,
    /// Only these names, when non-empty.
    pub names: Vec<String>,
    pub disabled: Vec<String>,
    /// Require the enable label to opt in.
    pub label_enable: bool,
    /// The agent's own container, exempt from the enable label.
    pub self_id: Option<ContainerId>,
}

impl ContainerFilter {
    crate::setters! {
        set { label_enable: bool }
        option { scope: String, self_id: ContainerId }
    }

    pub fn names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.disabled = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, c: &Container) -> bool {
        if !scope_matches(self.scope.as_deref(), c.scope()) {
            return false;
        }
        if !self.names.is_empty() && !self.names.iter().any(|n| normalize_name(n) == c.name()) {
            return false;
        }
        if self.disabled.iter().any(|n| normalize_name(n) == c.name()) {
            return false;
        }
        if self.self_id.as_ref() == Some(c.id()) {
            return true;
        }
        match (self.label_enable, c.enabled()) {
            (true, enabled) => enabled == Some(true),
            (false, enabled) => enabled != Some(false),
        }
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
