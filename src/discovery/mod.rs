//! Service discovery pipeline
//!
//! Each cycle walks the cluster in three stages:
//!
//! 1. [`task_definitions`] lists the cluster's services, keeps the ACTIVE ones
//!    and decides which of their task definitions are scrapable.
//! 2. [`targets`] lists RUNNING tasks and joins them against the scrapable
//!    task definitions.
//! 3. The attached network interfaces of matching tasks become `host:port`
//!    targets, grouped by task definition family.
//!
//! All calls are issued one after another; nothing is cached between cycles.

pub mod targets;
pub mod task_definitions;

pub use targets::{TargetGroup, TargetLabels};
pub use task_definitions::ScrapableTaskDefinition;

use crate::config::Config;
use crate::ecs::client::EcsApi;
use aws_sdk_ecs::types::LaunchType;

/// Discovery pipeline over one cluster
pub struct Discovery<A> {
    api: A,
    cluster: String,
    launch_type: LaunchType,
    required_env_vars: Vec<String>,
}

impl<A: EcsApi> Discovery<A> {
    pub fn new(api: A, config: &Config) -> Self {
        Self {
            api,
            cluster: config.cluster.clone(),
            launch_type: config.launch_type.clone(),
            required_env_vars: config.required_env_vars.clone(),
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }
}
