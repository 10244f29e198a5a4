// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wt_adapters::FakeRuntime;
use wt_core::labels;
use wt_core::test_support::fake_id;
use wt_core::{ContainerBuilder, FakeClock};

fn by_hostname(proc_root: &tempfile::TempDir, hostname: &str) -> IdentityResolver {
    IdentityResolver::new().proc_root(proc_root.path()).pid(42).hostname(hostname)
}

#[tokio::test]
async fn detects_self_and_resumes_chain() {
    let runtime = FakeRuntime::new();
    runtime.add(
        &ContainerBuilder::new("watchtower")
            .label(labels::SELF_MARKER, "true")
            .label(labels::CONTAINER_CHAIN, &fake_id("app")),
    );
    runtime.add(&ContainerBuilder::new("watchtower-0a1b2c3d").label(labels::SELF_MARKER, "true"));
    runtime.add(&ContainerBuilder::new("app"));
    let proc_root = tempfile::tempdir().unwrap();

    let started = startup(
        &runtime,
        &FakeClock::new(),
        &by_hostname(&proc_root, "watchtower"),
        &UpdateParams::default(),
    )
    .await
    .unwrap();

    assert_eq!(started.self_id, ContainerId::new(fake_id("watchtower")));
    assert_eq!(started.chain, vec![ContainerId::new(fake_id("app"))]);
    assert!(runtime.container("watchtower-0a1b2c3d").is_none());
}

#[tokio::test]
async fn unknown_identity_is_fatal() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("app"));
    let proc_root = tempfile::tempdir().unwrap();

    let err = startup(
        &runtime,
        &FakeClock::new(),
        &by_hostname(&proc_root, "not-a-container"),
        &UpdateParams::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, IdentityError::Unknown));
    assert!(runtime.writes().is_empty());
}
