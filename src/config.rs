//! Configuration Management
//!
//! Validated runtime configuration for the scraper, built from command-line
//! arguments.

use anyhow::{bail, Result};
use aws_sdk_ecs::types::LaunchType;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable carrying the metrics port in a task definition
pub const METRICS_PORT_VAR: &str = "METRICS_PORT";

/// Default time between discovery cycles, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 15;

/// Scraper configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// ECS cluster to search
    pub cluster: String,
    /// File the target groups are written to
    pub output: PathBuf,
    /// Time to wait between discovery cycles
    #[serde(serialize_with = "serialize_secs")]
    pub interval: Duration,
    /// Launch type of the services and tasks considered
    #[serde(serialize_with = "serialize_launch_type")]
    pub launch_type: LaunchType,
    /// Variables that must all be present in a task definition's container
    /// environment for its tasks to be scraped
    pub required_env_vars: Vec<String>,
}

impl Config {
    pub fn new(
        cluster: impl Into<String>,
        output: impl Into<PathBuf>,
        interval_secs: u64,
        required_env_vars: Vec<String>,
    ) -> Result<Self> {
        let cluster = cluster.into();
        let output = output.into();

        if cluster.trim().is_empty() {
            bail!("Cluster name must not be empty");
        }
        if output.as_os_str().is_empty() {
            bail!("Output filename must not be empty");
        }
        if interval_secs == 0 {
            bail!("Interval must be at least one second");
        }
        if required_env_vars.is_empty() {
            bail!("At least one required environment variable must be configured");
        }
        if let Some(name) = required_env_vars.iter().find(|name| name.trim().is_empty()) {
            bail!("Invalid required environment variable name: {:?}", name);
        }

        Ok(Self {
            cluster,
            output,
            interval: Duration::from_secs(interval_secs),
            launch_type: LaunchType::Fargate,
            required_env_vars,
        })
    }
}

fn serialize_secs<S: Serializer>(interval: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(interval.as_secs())
}

fn serialize_launch_type<S: Serializer>(
    launch_type: &LaunchType,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(launch_type.as_str())
}
