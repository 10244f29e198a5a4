// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency graph over one tick's containers.
//!
//! Nodes are indices into the input slice; an edge `a -> b` means `a`
//! depends on `b` (links to it, shares its network, or declares it in a
//! `depends_on`/`depends-on` label). Only edges whose target resolves to a
//! node are kept.

use crate::container::Container;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// Input for one graph node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphNode {
    /// Primary identifier.
    pub key: String,
    /// Further names the node may be referred to by, in priority order.
    pub aliases: Vec<String>,
    /// Names of the nodes this one depends on.
    pub links: Vec<String>,
}

impl GraphNode {
    pub fn new(key: impl Into<String>, links: &[&str]) -> Self {
        Self {
            key: key.into(),
            aliases: Vec::new(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl From<&Container> for GraphNode {
    fn from(c: &Container) -> Self {
        Self { key: c.identifier(), aliases: c.aliases(), links: c.links() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    /// Not yet visited.
    White,
    /// On the current DFS path stack.
    Gray,
    /// Finished and assigned to a component.
    Black,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    keys: Vec<String>,
    edges: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
}

impl DependencyGraph {
    pub fn build(nodes: &[GraphNode]) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.key.clone()).or_insert(i);
        }
        let depth = nodes.iter().map(|n| n.aliases.len()).max().unwrap_or(0);
        for layer in 0..depth {
            for (i, node) in nodes.iter().enumerate() {
                if let Some(alias) = node.aliases.get(layer) {
                    index.entry(alias.clone()).or_insert(i);
                }
            }
        }

        let edges = nodes
            .iter()
            .map(|node| {
                let mut targets: Vec<usize> = Vec::new();
                for link in &node.links {
                    if let Some(&t) = index.get(link) {
                        if !targets.contains(&t) {
                            targets.push(t);
                        }
                    }
                }
                targets
            })
            .collect();

        Self { keys: nodes.iter().map(|n| n.key.clone()).collect(), edges, index }
    }

    pub fn from_containers(containers: &[Container]) -> Self {
        let nodes: Vec<GraphNode> = containers.iter().map(GraphNode::from).collect();
        Self::build(&nodes)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, node: usize) -> &str {
        &self.keys[node]
    }

    /// Resolve an identifier or alias to its node.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn dependencies(&self, node: usize) -> &[usize] {
        &self.edges[node]
    }

    /// Every node that transitively depends on any of `seeds`, seeds excluded
    /// unless they are reached through another seed.
    pub fn dependents_of(&self, seeds: &[usize]) -> BTreeSet<usize> {
        let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); self.len()];
        for (from, targets) in self.edges.iter().enumerate() {
            for &to in targets {
                reverse[to].push(from);
            }
        }
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = seeds.to_vec();
        while let Some(n) = stack.pop() {
            for &dependent in &reverse[n] {
                if seen.insert(dependent) {
                    stack.push(dependent);
                }
            }
        }
        seen
    }

    /// Strongly connected components, each sorted by node index, emitted
    /// dependencies-first.
    ///
    /// Iterative Tarjan: white nodes are unvisited, gray nodes sit on the
    /// path stack, black nodes belong to an emitted component.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.len();
        let mut colour = vec![Colour::White; n];
        let mut order = vec![0usize; n];
        let mut low = vec![0usize; n];
        let mut next = 0usize;
        let mut path: Vec<usize> = Vec::new();
        let mut components = Vec::new();

        for root in 0..n {
            if colour[root] != Colour::White {
                continue;
            }
            order[root] = next;
            low[root] = next;
            next += 1;
            colour[root] = Colour::Gray;
            path.push(root);
            let mut work: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = work.last_mut() {
                let v = frame.0;
                if let Some(&w) = self.edges[v].get(frame.1) {
                    frame.1 += 1;
                    match colour[w] {
                        Colour::White => {
                            order[w] = next;
                            low[w] = next;
                            next += 1;
                            colour[w] = Colour::Gray;
                            path.push(w);
                            work.push((w, 0));
                        }
                        Colour::Gray => low[v] = low[v].min(order[w]),
                        Colour::Black => {}
                    }
                    continue;
                }

                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    low[parent] = low[parent].min(low[v]);
                }
                if low[v] == order[v] {
                    let mut component = Vec::new();
                    while let Some(w) = path.pop() {
                        colour[w] = Colour::Black;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort_unstable();
                    components.push(component);
                }
            }
        }
        components
    }

    /// Every node that participates in a cycle, self-loops included.
    pub fn cycles(&self) -> BTreeSet<usize> {
        self.components()
            .into_iter()
            .filter(|c| c.len() > 1 || self.edges[c[0]].contains(&c[0]))
            .flatten()
            .collect()
    }

    /// Identifiers of [`DependencyGraph::cycles`].
    pub fn cyclic_keys(&self) -> BTreeSet<String> {
        self.cycles().into_iter().map(|i| self.keys[i].clone()).collect()
    }

    /// Units in creation order: dependencies before dependents.
    ///
    /// Each unit is a single node or a whole cycle. Among units that are
    /// ready at the same time, the one whose first member comes earliest in
    /// the input goes first; members of a cycle keep input order.
    pub fn ordered_units(&self) -> Vec<Vec<usize>> {
        let components = self.components();
        let mut unit_of = vec![0usize; self.len()];
        for (u, members) in components.iter().enumerate() {
            for &m in members {
                unit_of[m] = u;
            }
        }

        let mut remaining = vec![0usize; components.len()];
        let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
        for (u, members) in components.iter().enumerate() {
            let deps: BTreeSet<usize> = members
                .iter()
                .flat_map(|&m| self.edges[m].iter().map(|&d| unit_of[d]))
                .filter(|&d| d != u)
                .collect();
            remaining[u] = deps.len();
            for d in deps {
                dependents[d].insert(u);
            }
        }

        let mut ready: BinaryHeap<Reverse<(usize, usize)>> = components
            .iter()
            .enumerate()
            .filter(|(u, _)| remaining[*u] == 0)
            .map(|(u, members)| Reverse((members[0], u)))
            .collect();

        let mut out = Vec::with_capacity(components.len());
        while let Some(Reverse((_, u))) = ready.pop() {
            out.push(components[u].clone());
            for &d in &dependents[u] {
                remaining[d] -= 1;
                if remaining[d] == 0 {
                    ready.push(Reverse((components[d][0], d)));
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
