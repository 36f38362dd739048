//! Poll Loop
//!
//! Runs a discovery cycle, writes the snapshot, then waits for the configured
//! interval, until the [`Lifecycle`] is stopped. A failed cycle is logged and
//! the next one runs after the usual interval; the interval doubles as the
//! retry delay.

use crate::config::Config;
use crate::discovery::Discovery;
use crate::ecs::client::EcsApi;
use crate::lifecycle::Lifecycle;
use crate::snapshot::write_snapshot;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub groups: usize,
    pub targets: usize,
}

pub struct Scraper<A> {
    discovery: Discovery<A>,
    output: PathBuf,
    interval: Duration,
}

impl<A: EcsApi> Scraper<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            discovery: Discovery::new(api, config),
            output: config.output.clone(),
            interval: config.interval,
        }
    }

    /// Run cycles until `lifecycle` is stopped. A stop request ends the
    /// inter-cycle wait early but never interrupts a cycle in progress.
    pub async fn run(&self, lifecycle: &Lifecycle) {
        tracing::info!(
            "Starting scraper for cluster {} (interval: {:?}, output: {})",
            self.discovery.cluster(),
            self.interval,
            self.output.display()
        );

        while lifecycle.is_running() {
            match self.run_once().await {
                Ok(summary) => tracing::debug!(
                    "Wrote {} targets in {} groups",
                    summary.targets,
                    summary.groups
                ),
                Err(e) => tracing::error!("Unhandled error encountered: {:#}", e),
            }

            tracing::debug!("Sleeping for {} seconds...", self.interval.as_secs());
            lifecycle.wait(self.interval).await;
        }

        tracing::info!("Scraper stopped.");
    }

    /// Resolve the current targets and write them out
    pub async fn run_once(&self) -> Result<CycleSummary> {
        tracing::debug!("Looking up targets...");
        let groups = self
            .discovery
            .resolve_targets()
            .await
            .context("Failed to resolve scrape targets")?;

        tracing::debug!("Writing targets...");
        write_snapshot(&self.output, &groups)?;

        Ok(CycleSummary {
            groups: groups.len(),
            targets: groups.iter().map(|group| group.targets.len()).sum(),
        })
    }
}
