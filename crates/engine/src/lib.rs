// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wt-engine: the container-graph reconciler
//!
//! One tick runs [`host`] → [`images`] → [`planner`] → [`executor`], with
//! [`lifecycle`] hooks around each update, and records a [`report`].
//! [`startup`] resumes an interrupted self-update before the first tick.

mod executor;
mod host;
mod images;
mod lifecycle;
mod params;
mod planner;
mod report;
mod session;
mod startup;

pub use executor::{ExecError, Executor};
pub use host::{HostError, HostView};
pub use images::{ImageCheckError, ImageChecker};
pub use lifecycle::{Hook, HookError, HookOutcome, HookRunner, EX_TEMPFAIL};
pub use params::{UpdateParams, DEFAULT_STOP_TIMEOUT};
pub use planner::{effective_flag, Plan, Planner};
pub use report::{Entry, Outcome, Report, SkipReason};
pub use session::{SessionError, UpdateSession};
pub use startup::{LifecycleError, Startup};
