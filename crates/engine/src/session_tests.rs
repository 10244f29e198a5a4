// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wt_adapters::{FailOp, FakeNotifyAdapter, FakeRuntime, RuntimeCall, RuntimeError};
use wt_core::labels;
use wt_core::test_support::fake_image_id;
use wt_core::{ContainerBuilder, FakeClock};

type TestSession = UpdateSession<FakeRuntime, FakeNotifyAdapter, FakeClock>;

fn session(runtime: &FakeRuntime, params: UpdateParams) -> (TestSession, FakeNotifyAdapter) {
    let notifier = FakeNotifyAdapter::new();
    let session = UpdateSession::new(runtime.clone(), notifier.clone(), FakeClock::new(), params);
    (session, notifier)
}

async fn tick(session: &TestSession) -> Report {
    session.tick(&CancellationToken::new()).await.unwrap()
}

#[tokio::test]
async fn container_without_image_info_is_skipped() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("bad").without_image_info());
    let (session, _) = session(&runtime, UpdateParams::default());

    let report = tick(&session).await;
    assert!(matches!(
        report.outcome("bad"),
        Some(Outcome::Skipped(SkipReason::InvalidConfig(_)))
    ));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn pull_failure_is_reported_and_nothing_is_written() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.fail(FailOp::Pull, "web:latest", RuntimeError::Transport("timeout".into()));
    let (session, _) = session(&runtime, UpdateParams::default());

    let report = tick(&session).await;
    assert!(matches!(report.outcome("web"), Some(Outcome::Failed { kind: "pull-failed", .. })));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn stop_failure_excludes_entry_and_others_proceed() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.add(&ContainerBuilder::new("db"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    runtime.set_pull_result("db:latest", "sha256:db2");
    runtime.fail(FailOp::Stop, "web", RuntimeError::Transport("eof".into()));
    let (session, notifier) = session(&runtime, UpdateParams::default());

    let report = tick(&session).await;
    assert!(matches!(report.outcome("web"), Some(Outcome::Failed { kind: "stop-failed", .. })));
    assert!(matches!(report.outcome("db"), Some(Outcome::Updated { .. })));
    let writes = runtime.writes();
    assert!(!writes.contains(&"remove(web)".to_string()));
    assert!(writes.contains(&"create(db)".to_string()));

    let message = &notifier.calls()[0].message;
    assert!(message.contains("Updated db"));
    assert!(message.contains("stop-failed"));
}

#[tokio::test]
async fn pre_update_tempfail_postpones_update() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web").label(labels::PRE_UPDATE, "drain"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    runtime.set_exec_exit("web", 75);
    let (session, notifier) = session(&runtime, UpdateParams::default().lifecycle_hooks(true));

    let report = tick(&session).await;
    assert_eq!(report.outcome("web"), Some(&Outcome::Skipped(SkipReason::HookTempFail)));
    assert!(runtime.writes().is_empty());
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn failing_pre_update_hook_does_not_block_update() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web").label(labels::PRE_UPDATE, "false"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    runtime.set_exec_exit("web", 1);
    let (session, _) = session(&runtime, UpdateParams::default().lifecycle_hooks(true));

    let report = tick(&session).await;
    assert_eq!(report.updated(), 1);
}

#[tokio::test]
async fn post_update_hook_runs_in_replacement() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web").label(labels::POST_UPDATE, "warm-cache"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    let (session, _) = session(&runtime, UpdateParams::default().lifecycle_hooks(true));

    tick(&session).await;
    let calls = runtime.calls();
    let created = calls.iter().position(|c| matches!(c, RuntimeCall::Create { .. })).unwrap();
    let exec = calls.iter().position(|c| matches!(c, RuntimeCall::Exec { .. })).unwrap();
    assert!(exec > created);
}

#[tokio::test]
async fn notification_title_names_host() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    let (session, notifier) = session(&runtime, UpdateParams::default());
    let session = session.hostname("box");

    tick(&session).await;
    let calls = notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].title, "Watchtower updates on box");
    assert!(calls[0].message.starts_with("Updated web"));
}

#[tokio::test]
async fn quiet_tick_sends_nothing() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    let (session, notifier) = session(&runtime, UpdateParams::default());

    let report = tick(&session).await;
    assert_eq!(report.outcome("web"), Some(&Outcome::Fresh));
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_tick() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    let (session, notifier) = session(&runtime, UpdateParams::default());
    notifier.set_failing(true);

    let report = tick(&session).await;
    assert_eq!(report.updated(), 1);
}

#[tokio::test]
async fn cancelled_before_tick_writes_nothing() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    let (session, _) = session(&runtime, UpdateParams::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = session.tick(&cancel).await.unwrap();
    assert_eq!(report.cancelled(), 1);
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn resumed_chain_is_recreated_once() {
    let runtime = FakeRuntime::new();
    let app = ContainerBuilder::new("app");
    runtime.add(&app);
    let (session, _) = session(&runtime, UpdateParams::default());
    session.resume_chain(vec![app.build().id().clone()]);

    let first = tick(&session).await;
    assert_eq!(first.updated(), 1);

    runtime.clear_calls();
    let second = tick(&session).await;
    assert_eq!(second.outcome("app"), Some(&Outcome::Fresh));
    assert!(runtime.writes().is_empty());
}

#[tokio::test]
async fn cleanup_removes_replaced_image() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    let (session, _) = session(&runtime, UpdateParams::default().cleanup(true));

    tick(&session).await;
    let expected = format!("remove_image({})", fake_image_id("web:latest"));
    assert_eq!(runtime.writes().last(), Some(&expected));
}

#[tokio::test]
async fn image_cleanup_is_off_by_default() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("web"));
    runtime.set_pull_result("web:latest", "sha256:web2");
    let (session, _) = session(&runtime, UpdateParams::default());

    tick(&session).await;
    assert!(!runtime.calls().iter().any(|c| matches!(c, RuntimeCall::RemoveImage(_))));
}

#[tokio::test]
async fn list_failure_fails_tick() {
    let runtime = FakeRuntime::new();
    runtime.fail_list(RuntimeError::Transport("socket closed".into()));
    let (session, _) = session(&runtime, UpdateParams::default());

    let err = session.tick(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, SessionError::Host(HostError::List(_))));
}

#[tokio::test]
async fn self_marked_container_is_handed_off_without_known_id() {
    let runtime = FakeRuntime::new();
    runtime.add(&ContainerBuilder::new("watchtower").label(labels::SELF_MARKER, "true"));
    runtime.set_pull_result("watchtower:latest", "sha256:wt2");
    let (session, _) = session(&runtime, UpdateParams::default());

    let report = tick(&session).await;
    assert!(matches!(report.outcome("watchtower"), Some(Outcome::Updated { .. })));
    let writes = runtime.writes();
    assert!(writes[0].starts_with("rename(watchtower->watchtower-"));
    assert_eq!(writes[1..], ["create(watchtower)", "start(watchtower)"]);
}
