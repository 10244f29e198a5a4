// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wt_adapters::{FakeRuntime, RuntimeCall};
use wt_core::ContainerBuilder;

fn setup(builder: ContainerBuilder) -> (FakeRuntime, Container) {
    let runtime = FakeRuntime::new();
    runtime.add(&builder);
    (runtime, builder.build())
}

fn exec_calls(runtime: &FakeRuntime) -> Vec<RuntimeCall> {
    runtime.calls().into_iter().filter(|c| matches!(c, RuntimeCall::Exec { .. })).collect()
}

#[yare::parameterized(
    both = { Some("1000"), Some("1000"), Some("1000:1000") },
    uid_only = { Some("33"), None, Some("33") },
    gid_only = { None, Some("33"), None },
    negative_uid = { Some("-1"), Some("5"), None },
    out_of_range = { Some("4294967296"), None, None },
    garbage_gid = { Some("7"), Some("x"), Some("7") },
)]
fn user_from_labels(uid: Option<&str>, gid: Option<&str>, expected: Option<&str>) {
    let mut map = Labels::new();
    if let Some(u) = uid {
        map.insert(labels::LIFECYCLE_UID.to_string(), u.to_string());
    }
    if let Some(g) = gid {
        map.insert(labels::LIFECYCLE_GID.to_string(), g.to_string());
    }
    assert_eq!(exec_user(&map).as_deref(), expected);
}

#[tokio::test]
async fn disabled_runner_never_execs() {
    let (runtime, web) = setup(ContainerBuilder::new("web").label(labels::PRE_UPDATE, "echo hi"));
    let outcome = HookRunner::new(runtime.clone(), false).pre_update(&web).await.unwrap();
    assert_eq!(outcome, HookOutcome::NotConfigured);
    assert!(exec_calls(&runtime).is_empty());
}

#[tokio::test]
async fn missing_label_is_not_configured() {
    let (runtime, web) = setup(ContainerBuilder::new("web"));
    let outcome = HookRunner::new(runtime, true).pre_check(&web).await.unwrap();
    assert_eq!(outcome, HookOutcome::NotConfigured);
}

#[tokio::test]
async fn runs_shell_command_as_labelled_user() {
    let (runtime, web) = setup(
        ContainerBuilder::new("web")
            .label(labels::PRE_UPDATE, "pg_dump > /backup")
            .label(labels::LIFECYCLE_UID, "999"),
    );
    let outcome = HookRunner::new(runtime.clone(), true).pre_update(&web).await.unwrap();
    assert_eq!(outcome, HookOutcome::Succeeded);
    assert_eq!(
        exec_calls(&runtime),
        vec![RuntimeCall::Exec {
            name: "web".into(),
            cmd: vec!["sh".into(), "-c".into(), "pg_dump > /backup".into()],
            user: Some("999".into()),
        }]
    );
}

#[tokio::test]
async fn stopped_container_skips_hook() {
    let (runtime, web) =
        setup(ContainerBuilder::new("web").stopped().label(labels::PRE_UPDATE, "true"));
    let outcome = HookRunner::new(runtime.clone(), true).pre_update(&web).await.unwrap();
    assert_eq!(outcome, HookOutcome::NotRunning);
    assert!(exec_calls(&runtime).is_empty());
}

#[tokio::test]
async fn tempfail_exit_postpones_update() {
    let (runtime, web) = setup(ContainerBuilder::new("web").label(labels::PRE_UPDATE, "busy"));
    runtime.set_exec_exit("web", EX_TEMPFAIL);
    let outcome = HookRunner::new(runtime, true).pre_update(&web).await.unwrap();
    assert_eq!(outcome, HookOutcome::TempFail);
}

#[tokio::test]
async fn tempfail_only_means_something_before_update() {
    let (runtime, web) = setup(ContainerBuilder::new("web").label(labels::PRE_CHECK, "busy"));
    runtime.set_exec_exit("web", EX_TEMPFAIL);
    let err = HookRunner::new(runtime, true).pre_check(&web).await.unwrap_err();
    assert!(matches!(err, HookError::Failed { code: 75, .. }));
}

#[tokio::test]
async fn other_exit_code_is_failure() {
    let (runtime, web) = setup(ContainerBuilder::new("web").label(labels::PRE_UPDATE, "false"));
    runtime.set_exec_exit("web", 1);
    let err = HookRunner::new(runtime, true).pre_update(&web).await.unwrap_err();
    assert!(matches!(err, HookError::Failed { hook: Hook::PreUpdate, code: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn hook_times_out_after_label_minutes() {
    let (runtime, web) = setup(
        ContainerBuilder::new("web")
            .label(labels::PRE_UPDATE, "sleep 600")
            .label(labels::PRE_UPDATE_TIMEOUT, "2"),
    );
    runtime.set_exec_delay(Duration::from_secs(600));
    let err = HookRunner::new(runtime, true).pre_update(&web).await.unwrap_err();
    assert!(matches!(err, HookError::TimedOut { minutes: 2, .. }));
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_is_unbounded() {
    let (runtime, web) = setup(
        ContainerBuilder::new("web")
            .label(labels::PRE_UPDATE, "sleep 600")
            .label(labels::PRE_UPDATE_TIMEOUT, "0"),
    );
    runtime.set_exec_delay(Duration::from_secs(600));
    let outcome = HookRunner::new(runtime, true).pre_update(&web).await.unwrap();
    assert_eq!(outcome, HookOutcome::Succeeded);
}

#[tokio::test]
async fn post_update_runs_in_replacement() {
    let (runtime, web) = setup(ContainerBuilder::new("web").label(labels::POST_UPDATE, "warm"));
    let new = ContainerBuilder::new("web-next");
    runtime.add(&new);
    let new_id = new.build().id().clone();

    let outcome =
        HookRunner::new(runtime.clone(), true).post_update(&web, &new_id, true).await.unwrap();
    assert_eq!(outcome, HookOutcome::Succeeded);
    assert!(matches!(&exec_calls(&runtime)[0], RuntimeCall::Exec { name, .. } if name == "web-next"));
}
