//! Scrapable task definitions
//!
//! A task definition is scrapable when the environment of its containers
//! carries every required variable. These variables come from the container
//! definitions registered in ECS, not from this process's environment.
//!
//! Matches are merged across the containers of one task definition: with
//! required variables `A` and `B`, a definition whose first container sets `A`
//! and whose second container sets `B` is scrapable even though no single
//! container carries both. When several containers set the same variable the
//! last one wins.
//!
//! A blank `METRICS_PORT` is treated as unset and falls back to
//! [`DEFAULT_METRICS_PORT`] rather than producing a `host:` target.

use super::Discovery;
use crate::config::METRICS_PORT_VAR;
use crate::ecs::batch::{batched, SERVICES_BATCH_SIZE};
use crate::ecs::client::EcsApi;
use crate::ecs::paginate::paginate;
use crate::ecs::types::TaskDefinitionDescriptor;
use anyhow::Result;
use futures::TryStreamExt;
use std::collections::{HashMap, HashSet};

/// Port used when a scrapable task definition does not set `METRICS_PORT`
pub const DEFAULT_METRICS_PORT: &str = "8000";

/// Family label used when a task definition reports no family
const UNKNOWN_FAMILY: &str = "unknown";

/// Scrape metadata extracted from a task definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapableTaskDefinition {
    pub arn: String,
    pub family: String,
    pub metrics_port: String,
}

impl ScrapableTaskDefinition {
    /// Extract scrape metadata, or `None` if any required variable is missing
    pub fn from_descriptor(
        arn: &str,
        definition: &TaskDefinitionDescriptor,
        required_env_vars: &[String],
    ) -> Option<Self> {
        let mut matched: HashMap<&str, &str> = HashMap::new();
        for container in &definition.containers {
            for var in &container.environment {
                let name = var.name.as_str();
                if name == METRICS_PORT_VAR || required_env_vars.iter().any(|r| r == name) {
                    matched.insert(name, var.value.as_str());
                }
            }
        }

        if !required_env_vars
            .iter()
            .all(|name| matched.contains_key(name.as_str()))
        {
            return None;
        }

        let family = if definition.family.is_empty() {
            UNKNOWN_FAMILY
        } else {
            definition.family.as_str()
        };

        let metrics_port = matched
            .get(METRICS_PORT_VAR)
            .map(|port| port.trim())
            .filter(|port| !port.is_empty())
            .unwrap_or(DEFAULT_METRICS_PORT);

        Some(Self {
            arn: arn.to_string(),
            family: family.to_string(),
            metrics_port: metrics_port.to_string(),
        })
    }
}

impl<A: EcsApi> Discovery<A> {
    /// Task definitions deployed by ACTIVE services, each listed once, in
    /// order of first appearance
    pub async fn active_task_definitions(&self) -> Result<Vec<String>> {
        let service_arns = paginate(move |token| {
            self.api
                .list_services(&self.cluster, self.launch_type.clone(), token)
        });
        let mut batches = std::pin::pin!(batched(service_arns, SERVICES_BATCH_SIZE));

        let mut seen = HashSet::new();
        let mut references = Vec::new();
        while let Some(batch) = batches.try_next().await? {
            for service in self.api.describe_services(&self.cluster, batch).await? {
                if !service.is_active() {
                    continue;
                }
                if let Some(arn) = service.task_definition {
                    if seen.insert(arn.clone()) {
                        references.push(arn);
                    }
                }
            }
        }

        Ok(references)
    }

    /// Scrapable task definitions of the cluster, keyed by ARN
    pub async fn scrapable_task_definitions(
        &self,
    ) -> Result<HashMap<String, ScrapableTaskDefinition>> {
        let mut scrapable = HashMap::new();

        for arn in self.active_task_definitions().await? {
            let Some(definition) = self.api.describe_task_definition(&arn).await? else {
                continue;
            };

            match ScrapableTaskDefinition::from_descriptor(&arn, &definition, &self.required_env_vars) {
                Some(task_definition) => {
                    scrapable.insert(arn, task_definition);
                }
                None => tracing::trace!("Task definition {} is not scrapable", arn),
            }
        }

        tracing::debug!("Found {} scrapable task definitions", scrapable.len());
        Ok(scrapable)
    }
}
