// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Update parameters shared by every tick.

use std::time::Duration;
use wt_core::ContainerFilter;

/// Default grace period between the stop signal and a kill.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct UpdateParams {
    pub filter: ContainerFilter,
    /// Global monitor-only: detect but never recreate.
    pub monitor_only: bool,
    pub no_pull: bool,
    /// Per-container labels override the global flags outright.
    pub label_precedence: bool,
    pub include_stopped: bool,
    pub include_restarting: bool,
    pub revive_stopped: bool,
    pub remove_volumes: bool,
    pub rolling_restart: bool,
    pub cleanup: bool,
    pub lifecycle_hooks: bool,
    pub stop_timeout: Duration,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            filter: ContainerFilter::default(),
            monitor_only: false,
            no_pull: false,
            label_precedence: false,
            include_stopped: false,
            include_restarting: false,
            revive_stopped: false,
            remove_volumes: false,
            rolling_restart: false,
            cleanup: false,
            lifecycle_hooks: false,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

impl UpdateParams {
    wt_core::setters! {
        set {
            filter: ContainerFilter,
            monitor_only: bool,
            no_pull: bool,
            label_precedence: bool,
            include_stopped: bool,
            include_restarting: bool,
            revive_stopped: bool,
            remove_volumes: bool,
            rolling_restart: bool,
            cleanup: bool,
            lifecycle_hooks: bool,
            stop_timeout: Duration,
        }
    }
}
