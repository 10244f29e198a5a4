// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wt-daemon: flags, logging, startup handoff and the tick scheduler
//! behind the `watchtower` binary.

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod scheduler;

pub use config::{Config, ConfigError, LogFormat};
pub use lifecycle::{startup, Started};
pub use scheduler::Scheduler;
