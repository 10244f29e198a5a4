// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wt-core: container model and dependency graph for the watchtower agent

pub mod macros;

pub mod api_version;
pub mod clock;
pub mod container;
mod create_config;
pub mod filter;
pub mod graph;
pub mod id;
pub mod labels;
pub mod model;
pub mod network;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use api_version::ApiVersion;
pub use clock::{Clock, FakeClock, SystemClock};
pub use container::{Container, ModelError, UpdateFlags};
pub use filter::{scope_matches, ContainerFilter};
pub use graph::{DependencyGraph, GraphNode};
pub use id::{normalize_name, short, ContainerId, ImageId, SHORT_ID_LEN};
pub use labels::Labels;
pub use model::{
    ContainerConfig, ContainerDetails, EndpointSettings, HostConfig, ImageDetails,
    NetworkingConfig,
};
pub use network::{rebuild_network_config, validate_mac_addresses, MacAddressError};
#[cfg(any(test, feature = "test-support"))]
pub use test_support::ContainerBuilder;
