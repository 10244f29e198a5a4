// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line flags. Every flag can also come from a `WATCHTOWER_*`
//! environment variable.

use clap::{Parser, ValueEnum};
use std::time::Duration;
use thiserror::Error;
use wt_core::ContainerFilter;
use wt_engine::UpdateParams;

/// Seconds between ticks when `--interval` is not given.
pub const DEFAULT_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--interval must be greater than zero unless --run-once is set")]
    ZeroInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

wt_core::simple_display! {
    LogLevel {
        Error => "error",
        Warn => "warn",
        Info => "info",
        Debug => "debug",
        Trace => "trace",
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "watchtower", version, about = "Keep running containers on their newest images")]
pub struct Config {
    /// Only watch these containers
    pub containers: Vec<String>,

    /// Seconds between update checks
    #[arg(long, short = 'i', env = "WATCHTOWER_POLL_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Run a single check and exit
    #[arg(long, env = "WATCHTOWER_RUN_ONCE")]
    pub run_once: bool,

    /// Report available updates without recreating anything
    #[arg(long, env = "WATCHTOWER_MONITOR_ONLY")]
    pub monitor_only: bool,

    /// Compare against local images only
    #[arg(long, env = "WATCHTOWER_NO_PULL")]
    pub no_pull: bool,

    /// Per-container labels override the global flags
    #[arg(long = "label-take-precedence", env = "WATCHTOWER_LABEL_TAKE_PRECEDENCE")]
    pub label_precedence: bool,

    /// Also check created and exited containers
    #[arg(long, env = "WATCHTOWER_INCLUDE_STOPPED")]
    pub include_stopped: bool,

    /// Also check restarting containers
    #[arg(long, env = "WATCHTOWER_INCLUDE_RESTARTING")]
    pub include_restarting: bool,

    /// Start recreated containers that were stopped
    #[arg(long, env = "WATCHTOWER_REVIVE_STOPPED")]
    pub revive_stopped: bool,

    /// Remove anonymous volumes with the old container
    #[arg(long, env = "WATCHTOWER_REMOVE_VOLUMES")]
    pub remove_volumes: bool,

    /// Recreate one container at a time
    #[arg(long, env = "WATCHTOWER_ROLLING_RESTART")]
    pub rolling_restart: bool,

    /// Remove replaced images
    #[arg(long, env = "WATCHTOWER_CLEANUP")]
    pub cleanup: bool,

    /// Only watch containers whose enable label is true
    #[arg(long, env = "WATCHTOWER_LABEL_ENABLE")]
    pub label_enable: bool,

    /// Never watch these containers
    #[arg(long, env = "WATCHTOWER_DISABLE_CONTAINERS", value_delimiter = ',')]
    pub disable_containers: Vec<String>,

    /// Only watch containers with this scope label
    #[arg(long, env = "WATCHTOWER_SCOPE")]
    pub scope: Option<String>,

    /// Default seconds to wait after the stop signal
    #[arg(long, env = "WATCHTOWER_TIMEOUT", default_value_t = 10)]
    pub stop_timeout: u64,

    /// Run lifecycle hook commands from container labels
    #[arg(long, env = "WATCHTOWER_LIFECYCLE_HOOKS")]
    pub enable_lifecycle_hooks: bool,

    /// Container runtime endpoint
    #[arg(long, short = 'H', env = "DOCKER_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "WATCHTOWER_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, env = "WATCHTOWER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Shorthand for --log-level debug
    #[arg(long, env = "WATCHTOWER_DEBUG")]
    pub debug: bool,

    /// Shorthand for --log-level trace
    #[arg(long, env = "WATCHTOWER_TRACE")]
    pub trace: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 && !self.run_once {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn log_level(&self) -> LogLevel {
        if self.trace {
            LogLevel::Trace
        } else if self.debug {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }

    pub fn update_params(&self) -> UpdateParams {
        let mut filter = ContainerFilter::default()
            .label_enable(self.label_enable)
            .names(self.containers.iter().cloned())
            .disabled(self.disable_containers.iter().map(|s| s.trim().to_string()));
        if let Some(scope) = &self.scope {
            filter = filter.scope(scope.clone());
        }
        UpdateParams::default()
            .filter(filter)
            .monitor_only(self.monitor_only)
            .no_pull(self.no_pull)
            .label_precedence(self.label_precedence)
            .include_stopped(self.include_stopped)
            .include_restarting(self.include_restarting)
            .revive_stopped(self.revive_stopped)
            .remove_volumes(self.remove_volumes)
            .rolling_restart(self.rolling_restart)
            .cleanup(self.cleanup)
            .lifecycle_hooks(self.enable_lifecycle_hooks)
            .stop_timeout(Duration::from_secs(self.stop_timeout))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
