// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber setup. `RUST_LOG` wins over the configured level.

use crate::config::{Config, LogFormat};
use tracing_subscriber::EnvFilter;

pub fn filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level().to_string()))
}

pub fn init(config: &Config) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(config)).with_target(false);
    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("installing log subscriber: {}", e))
}
