// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end ticks against the fake runtime.

#![allow(clippy::unwrap_used)]

use tokio_util::sync::CancellationToken;
use wt_adapters::{FakeNotifyAdapter, FakeRuntime};
use wt_core::labels;
use wt_core::test_support::fake_id;
use wt_core::{ContainerBuilder, ContainerId, FakeClock};
use wt_engine::{Outcome, Report, SkipReason, UpdateParams, UpdateSession};

type Session = UpdateSession<FakeRuntime, FakeNotifyAdapter, FakeClock>;

fn session(runtime: &FakeRuntime, params: UpdateParams) -> Session {
    UpdateSession::new(runtime.clone(), FakeNotifyAdapter::new(), FakeClock::new(), params)
}

async fn tick(session: &Session) -> Report {
    session.tick(&CancellationToken::new()).await.unwrap()
}

fn depends_on(name: &str, deps: &str) -> ContainerBuilder {
    ContainerBuilder::new(name).label(labels::DEPENDS_ON, deps)
}

fn running_image(runtime: &FakeRuntime, name: &str) -> String {
    let details = runtime.container(name).unwrap();
    assert!(details.state.unwrap().running, "{} should be running", name);
    details.image
}

#[tokio::test]
async fn unchanged_images_touch_nothing() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("c1"));
    runtime.add(&ContainerBuilder::new("c2").link("c1"));

    let report = tick(&session(&runtime, UpdateParams::default())).await;
    assert_eq!((report.scanned(), report.updated(), report.failed()), (2, 0, 0));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn dependent_is_stopped_first_and_started_last() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web").link("api"));
    runtime.add(&ContainerBuilder::new("api"));
    runtime.set_pull_result("api:latest", "sha256:api2");

    let report = tick(&session(&runtime, UpdateParams::default())).await;
    assert_eq!(
        runtime.writes(),
        vec![
            "stop(web)",
            "stop(api)",
            "remove(web)",
            "remove(api)",
            "create(api)",
            "start(api)",
            "create(web)",
            "start(web)",
        ]
    );
    assert_eq!(report.updated(), 2);
    assert_eq!(running_image(&runtime, "api"), "sha256:api2");
    running_image(&runtime, "web");
}

#[tokio::test]
async fn rolling_restart_finishes_each_container_before_the_next() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web").link("api"));
    runtime.add(&ContainerBuilder::new("api"));
    runtime.set_pull_result("api:latest", "sha256:api2");

    tick(&session(&runtime, UpdateParams::default().rolling_restart(true))).await;
    assert_eq!(
        runtime.writes(),
        vec![
            "stop(api)",
            "remove(api)",
            "create(api)",
            "start(api)",
            "stop(web)",
            "remove(web)",
            "create(web)",
            "start(web)",
        ]
    );
}

#[tokio::test]
async fn agent_replaces_itself_last() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("watchtower").label(labels::SELF_MARKER, "true"));
    runtime.add(&ContainerBuilder::new("app"));
    runtime.set_pull_result("watchtower:latest", "sha256:wt2");
    let me = ContainerId::new(fake_id("watchtower"));

    let report = tick(&session(&runtime, UpdateParams::default()).self_id(me)).await;
    assert_eq!(report.outcome("app"), Some(&Outcome::Fresh));
    assert!(matches!(report.outcome("watchtower"), Some(Outcome::Updated { .. })));

    let writes = runtime.writes();
    assert!(writes[0].starts_with("rename(watchtower->watchtower-"));
    assert_eq!(writes[1..], ["create(watchtower)", "start(watchtower)"]);

    let successor = runtime.container("watchtower").unwrap();
    let successor_labels = successor.config.unwrap().labels.unwrap();
    assert_eq!(successor_labels[labels::SELF_MARKER], "true");
    assert!(!successor_labels.contains_key(labels::CONTAINER_CHAIN));
}

#[tokio::test]
async fn agent_dependents_are_left_to_successor() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("watchtower").label(labels::SELF_MARKER, "true"));
    runtime.add(&depends_on("app", "watchtower"));
    runtime.set_pull_result("watchtower:latest", "sha256:wt2");
    let me = ContainerId::new(fake_id("watchtower"));

    let report = tick(&session(&runtime, UpdateParams::default()).self_id(me)).await;
    assert_eq!(report.outcome("app"), Some(&Outcome::Deferred));
    assert!(!runtime.writes().iter().any(|w| w.contains("(app")));

    let successor_labels = runtime.container("watchtower").unwrap().config.unwrap().labels.unwrap();
    assert_eq!(successor_labels[labels::CONTAINER_CHAIN], fake_id("app"));
}

#[tokio::test]
async fn pinned_image_is_skipped() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("c").image(
        "sha256:fa5269854a5e615e51a72b17ad3fd1e01268f278a6684c8ed3c5f0cdce3f230b",
    ));

    let report = tick(&session(&runtime, UpdateParams::default())).await;
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.outcome("c"), Some(&Outcome::Skipped(SkipReason::PinnedImage)));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn dependency_cycle_is_recreated_in_listing_order() {
    let runtime = FakeRuntime::new();
    runtime.add(&depends_on("a", "b"));
    runtime.add(&depends_on("b", "c"));
    runtime.add(&depends_on("c", "a"));
    for name in ["a", "b", "c"] {
        runtime.set_pull_result(&format!("{}:latest", name), &format!("sha256:{}2", name));
    }

    let report = tick(&session(&runtime, UpdateParams::default())).await;
    assert_eq!(report.updated(), 3);
    let creates: Vec<String> =
        runtime.writes().into_iter().filter(|w| w.starts_with("create(")).collect();
    assert_eq!(creates, vec!["create(a)", "create(b)", "create(c)"]);
    for name in ["a", "b", "c"] {
        assert_eq!(running_image(&runtime, name), format!("sha256:{}2", name));
    }
}

#[tokio::test]
async fn network_peer_is_referenced_by_name_after_recreate() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("app"));
    runtime.add(&ContainerBuilder::new("logger").network_mode(&format!("container:{}", fake_id("app"))));
    runtime.set_pull_result("app:latest", "sha256:app2");

    let report = tick(&session(&runtime, UpdateParams::default())).await;
    assert_eq!(report.updated(), 2);
    let creates: Vec<String> =
        runtime.writes().into_iter().filter(|w| w.starts_with("create(")).collect();
    assert_eq!(creates, vec!["create(app)", "create(logger)"]);

    let logger = runtime.container("logger").unwrap();
    assert_eq!(logger.host_config.unwrap().network_mode.as_deref(), Some("container:app"));
}

#[tokio::test]
async fn second_tick_after_update_is_a_no_op() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web").link("api"));
    runtime.add(&ContainerBuilder::new("api"));
    runtime.set_pull_result("api:latest", "sha256:api2");
    let session = session(&runtime, UpdateParams::default());

    tick(&session).await;
    runtime.clear_calls();
    let report = tick(&session).await;
    assert_eq!(report.updated(), 0);
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn monitor_only_reports_without_writing() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.set_pull_result("web:latest", "sha256:web2");

    let report = tick(&session(&runtime, UpdateParams::default().monitor_only(true))).await;
    assert_eq!(report.outcome("web"), Some(&Outcome::MonitorOnly));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn stopped_container_is_recreated_but_not_started() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("batch").stopped());
    runtime.set_pull_result("batch:latest", "sha256:batch2");

    let params = UpdateParams::default().include_stopped(true);
    let report = tick(&session(&runtime, params)).await;
    assert_eq!(report.updated(), 1);
    assert_eq!(runtime.writes(), vec!["remove(batch)", "create(batch)"]);
}
