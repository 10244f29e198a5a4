// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wt-adapters: runtime API, self identity, registry credentials, notifier

pub mod identity;
pub mod notify;
pub mod registry;
pub mod runtime;

pub use identity::{IdentityError, IdentityResolver};
pub use notify::{LogNotifyAdapter, NotifyAdapter, NotifyError};
pub use registry::RegistryAuth;
pub use runtime::{
    ContainerStatus, CreateRequest, DockerRuntime, ExecOutput, ExecRequest, RemoveOptions,
    RuntimeApi, RuntimeError,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use runtime::{FailOp, FakeRuntime, RuntimeCall};
