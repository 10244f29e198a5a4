// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staleness check: pull, re-inspect, compare image ids.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use wt_adapters::{registry, RuntimeApi, RuntimeError};
use wt_core::{Container, ImageId};

#[derive(Debug, Error)]
pub enum ImageCheckError {
    #[error("{image} is pinned to a digest")]
    Pinned { image: String },
    #[error("pulling {image} failed: {source}")]
    PullFailed {
        image: String,
        #[source]
        source: RuntimeError,
    },
    #[error("cancelled")]
    Cancelled,
}

/// Decides whether a container's image has moved on.
#[derive(Clone)]
pub struct ImageChecker<R> {
    runtime: R,
}

impl<R: RuntimeApi> ImageChecker<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    /// Pull (unless `no_pull`) and compare the tag's image id with the
    /// running one. Marks the container stale and records its old image id
    /// when they differ.
    pub async fn check(
        &self,
        container: &Container,
        no_pull: bool,
        cancel: &CancellationToken,
    ) -> Result<bool, ImageCheckError> {
        let image = container.image_name();
        if container.image_is_pinned() {
            return Err(ImageCheckError::Pinned { image });
        }

        if no_pull {
            tracing::debug!(container = %container.name(), %image, "skipping pull");
        } else {
            let auth = registry::resolve(&image);
            match self.runtime.pull_image(&image, auth.as_ref(), cancel).await {
                Ok(()) => {}
                Err(RuntimeError::Cancelled) => return Err(ImageCheckError::Cancelled),
                Err(source) => return Err(ImageCheckError::PullFailed { image, source }),
            }
        }

        let latest = self
            .runtime
            .inspect_image(&image)
            .await
            .map_err(|source| ImageCheckError::PullFailed { image: image.clone(), source })?;

        let running = container.image_id();
        if latest.id == running.as_str() {
            tracing::debug!(container = %container.name(), %image, "image is current");
            return Ok(false);
        }

        tracing::info!(
            container = %container.name(),
            %image,
            old = running.short(),
            new = ImageId::new(latest.id.clone()).short(),
            "found newer image"
        );
        container.set_stale(true);
        container.set_old_image_id(running);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "images_tests.rs"]
mod tests;
