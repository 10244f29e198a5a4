// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `watchtower`: keeps running containers on their newest images.

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use wt_adapters::{DockerRuntime, IdentityResolver, LogNotifyAdapter};
use wt_core::SystemClock;
use wt_daemon::lifecycle::spawn_shutdown_listener;
use wt_daemon::{env, logging, startup, Config, Scheduler};
use wt_engine::UpdateSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate()?;
    logging::init(&config)?;
    run(config).await
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "watchtower starting");
    let runtime = DockerRuntime::connect(config.host.as_deref())
        .await
        .context("connecting to container runtime")?;

    let mut params = config.update_params();
    let clock = SystemClock;
    let started = startup(&runtime, &clock, &IdentityResolver::new(), &params)
        .await
        .context("detecting own container")?;
    params.filter = params.filter.self_id(started.self_id.clone());

    let session = UpdateSession::new(runtime, LogNotifyAdapter::new(), clock, params)
        .hostname(env::hostname())
        .self_id(started.self_id);
    session.resume_chain(started.chain);

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());
    Scheduler::new(session, config.interval(), config.run_once).run(&cancel).await?;
    Ok(())
}
