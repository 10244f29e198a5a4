// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tick outcome of every scanned container.

use std::fmt::Write;
use wt_core::ContainerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Image reference is a digest.
    PinnedImage,
    /// Snapshot unusable for recreation.
    InvalidConfig(String),
    /// Pre-update hook asked to try again later.
    HookTempFail,
}

wt_core::simple_display! {
    SkipReason {
        PinnedImage => "pinned-image",
        InvalidConfig(..) => "invalid-config",
        HookTempFail => "pre-update-tempfail",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Fresh,
    Updated { new_id: ContainerId },
    Failed { kind: &'static str, cause: String },
    Skipped(SkipReason),
    /// Stale, but monitor-only.
    MonitorOnly,
    /// Waits for the agent's successor to recreate it.
    Deferred,
    Cancelled,
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub id: ContainerId,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

/// Outcomes in scan order; one entry per container.
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: Vec<Entry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or replace the outcome for `id`.
    pub fn record(&mut self, name: &str, id: &ContainerId, outcome: Outcome, elapsed_ms: u64) {
        match self.entries.iter_mut().find(|e| &e.id == id) {
            Some(entry) => {
                entry.outcome = outcome;
                entry.elapsed_ms = elapsed_ms;
            }
            None => self.entries.push(Entry {
                name: name.to_string(),
                id: id.clone(),
                outcome,
                elapsed_ms,
            }),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.outcome)
    }

    pub fn scanned(&self) -> usize {
        self.entries.len()
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Cancelled))
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.entries.iter().filter(|e| f(&e.outcome)).count()
    }

    /// Body of the tick notification; `None` when nothing was updated or
    /// failed.
    pub fn notification(&self) -> Option<String> {
        if self.updated() == 0 && self.failed() == 0 {
            return None;
        }
        let mut body = String::new();
        for entry in &self.entries {
            match &entry.outcome {
                Outcome::Updated { new_id } => {
                    let _ = writeln!(
                        body,
                        "Updated {} ({} -> {})",
                        entry.name,
                        entry.id.short(),
                        new_id.short()
                    );
                }
                Outcome::Failed { kind, cause } => {
                    let _ = writeln!(body, "Failed {} ({}): {}: {}", entry.name, entry.id.short(), kind, cause);
                }
                _ => {}
            }
        }
        Some(body.trim_end().to_string())
    }

    /// Log the summary line and each failure once.
    pub fn log(&self) {
        for entry in &self.entries {
            if let Outcome::Failed { kind, cause } = &entry.outcome {
                tracing::error!(
                    container = %entry.name,
                    id = entry.id.short(),
                    elapsed_ms = entry.elapsed_ms,
                    kind,
                    "update failed: {}",
                    cause
                );
            }
        }
        tracing::info!(
            scanned = self.scanned(),
            updated = self.updated(),
            failed = self.failed(),
            skipped = self.skipped(),
            "session done"
        );
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
