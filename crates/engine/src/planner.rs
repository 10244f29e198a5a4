// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Update planner: which containers to recreate, and in what order.
//!
//! Works on one tick's snapshot after staleness has been decided:
//!
//! 1. Resolve effective monitor-only per container.
//! 2. Flag every transitive dependent of a container being recreated as
//!    linked-to-restarting (whole cycles included).
//! 3. Order the recreate set over the dependency graph: create order puts
//!    dependencies first, stop order is its reverse. A cycle forms a
//!    single unit whose members keep listing order.
//! 4. Pull the agent's own container out of the order, found by id or by
//!    the self-marker when the id is unknown. Containers that depend on it
//!    wait for its successor (the chain).

use crate::params::UpdateParams;
use std::collections::BTreeSet;
use wt_core::{Container, ContainerId, DependencyGraph};

/// Resolve a global flag against its per-container label.
///
/// With label precedence a present label decides outright; otherwise
/// either side enabling the flag wins. Absent or invalid labels defer to
/// the global value.
pub fn effective_flag(global: bool, label: Option<bool>, label_precedence: bool) -> bool {
    match label {
        Some(value) if label_precedence => value,
        Some(value) => global || value,
        None => global,
    }
}

/// Indices into the tick's container list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Recreate units, dependencies first. Excludes the agent and the chain.
    pub units: Vec<Vec<usize>>,
    /// The agent's own container when it needs replacing.
    pub agent: Option<usize>,
    /// Dependents of the agent, in create order, left to its successor.
    pub chain: Vec<usize>,
    /// Containers that need an update but are monitor-only.
    pub monitor_only: Vec<usize>,
    /// Members of dependency cycles.
    pub cyclic: BTreeSet<usize>,
}

impl Plan {
    /// Create order of the units.
    pub fn create_order(&self) -> Vec<usize> {
        self.units.iter().flatten().copied().collect()
    }

    /// Dependents before their dependencies.
    pub fn stop_order(&self) -> Vec<usize> {
        self.units.iter().rev().flatten().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.agent.is_none()
    }
}

pub struct Planner<'a> {
    params: &'a UpdateParams,
    self_id: Option<&'a ContainerId>,
}

impl<'a> Planner<'a> {
    pub fn new(params: &'a UpdateParams, self_id: Option<&'a ContainerId>) -> Self {
        Self { params, self_id }
    }

    pub fn monitor_only(&self, container: &Container) -> bool {
        effective_flag(
            self.params.monitor_only,
            container.monitor_only_label(),
            self.params.label_precedence,
        )
    }

    pub fn no_pull(&self, container: &Container) -> bool {
        effective_flag(self.params.no_pull, container.no_pull_label(), self.params.label_precedence)
    }

    /// Build the plan, setting linked-to-restarting on the containers as a
    /// side effect.
    pub fn plan(&self, containers: &[Container]) -> Plan {
        let graph = DependencyGraph::from_containers(containers);
        let monitor_only: Vec<bool> = containers.iter().map(|c| self.monitor_only(c)).collect();

        let seeds: Vec<usize> = (0..containers.len())
            .filter(|&i| containers[i].to_restart() && !monitor_only[i])
            .collect();
        for i in graph.dependents_of(&seeds) {
            if !containers[i].to_restart() {
                tracing::debug!(container = %containers[i].name(), "linked to restarting container");
            }
            containers[i].set_linked_to_restarting(true);
        }

        let cyclic = graph.cycles();
        if !cyclic.is_empty() {
            let names: Vec<&str> = cyclic.iter().map(|&i| containers[i].name()).collect();
            tracing::warn!(containers = ?names, "dependency cycle detected");
        }

        let recreate: BTreeSet<usize> = (0..containers.len())
            .filter(|&i| containers[i].to_restart() && !monitor_only[i])
            .collect();
        let monitor_only = (0..containers.len())
            .filter(|&i| containers[i].to_restart() && monitor_only[i])
            .collect();

        let agent = match self.self_id {
            Some(id) => containers.iter().position(|c| c.id() == id),
            None => recreate.iter().copied().find(|&i| containers[i].is_self_marker()),
        }
        .filter(|i| recreate.contains(i));
        let waiting: BTreeSet<usize> = match agent {
            Some(a) => {
                graph.dependents_of(&[a]).into_iter().filter(|&i| i != a && recreate.contains(&i)).collect()
            }
            None => BTreeSet::new(),
        };

        let mut units = Vec::new();
        let mut chain = Vec::new();
        for unit in graph.ordered_units() {
            let mut members = Vec::new();
            for i in unit {
                if Some(i) == agent || !recreate.contains(&i) {
                    continue;
                }
                if waiting.contains(&i) {
                    chain.push(i);
                } else {
                    members.push(i);
                }
            }
            if !members.is_empty() {
                units.push(members);
            }
        }

        Plan { units, agent, chain, monitor_only, cyclic }
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
