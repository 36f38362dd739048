//! Scrape target resolution
//!
//! Joins the cluster's RUNNING tasks against the scrapable task definitions
//! and turns their attached network interfaces into `host:port` targets,
//! grouped by task definition family.
//!
//! An attachment reporting an empty private address contributes no target;
//! a bare `:port` entry is never written.

use super::task_definitions::ScrapableTaskDefinition;
use super::Discovery;
use crate::ecs::batch::{batched, TASKS_BATCH_SIZE};
use crate::ecs::client::EcsApi;
use crate::ecs::paginate::paginate;
use crate::ecs::types::TaskDescriptor;
use anyhow::Result;
use aws_sdk_ecs::types::DesiredStatus;
use futures::TryStreamExt;
use serde::Serialize;
use std::collections::HashMap;

/// Labels attached to every target of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetLabels {
    pub family: String,
}

/// Targets of one task definition family, as written to the discovery file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetGroup {
    pub targets: Vec<String>,
    pub labels: TargetLabels,
}

impl TargetGroup {
    fn new(family: &str) -> Self {
        Self {
            targets: Vec::new(),
            labels: TargetLabels {
                family: family.to_string(),
            },
        }
    }
}

/// Groups keyed by family, in order of first discovery
#[derive(Debug, Default)]
struct TargetGroups {
    groups: Vec<TargetGroup>,
    index: HashMap<String, usize>,
}

impl TargetGroups {
    fn push(&mut self, family: &str, target: String) {
        let position = match self.index.get(family) {
            Some(&position) => position,
            None => {
                self.groups.push(TargetGroup::new(family));
                self.index.insert(family.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[position].targets.push(target);
    }

    fn into_vec(self) -> Vec<TargetGroup> {
        self.groups
    }
}

/// `host:port` targets for `task`, or none if its task definition is not
/// scrapable
pub fn scrape_targets<'a>(
    task: &'a TaskDescriptor,
    scrapable: &'a HashMap<String, ScrapableTaskDefinition>,
) -> Option<(&'a ScrapableTaskDefinition, Vec<String>)> {
    let definition = scrapable.get(task.task_definition_arn.as_deref()?)?;
    let targets = task
        .private_addresses()
        .filter(|address| !address.is_empty())
        .map(|address| format!("{}:{}", address, definition.metrics_port))
        .collect();
    Some((definition, targets))
}

impl<A: EcsApi> Discovery<A> {
    /// Resolve the cluster's current scrape targets
    pub async fn resolve_targets(&self) -> Result<Vec<TargetGroup>> {
        let task_arns = paginate(move |token| {
            self.api.list_tasks(
                &self.cluster,
                DesiredStatus::Running,
                self.launch_type.clone(),
                token,
            )
        });
        let mut batches = std::pin::pin!(batched(task_arns, TASKS_BATCH_SIZE));

        let scrapable = self.scrapable_task_definitions().await?;
        let mut groups = TargetGroups::default();

        while let Some(batch) = batches.try_next().await? {
            for task in self.api.describe_tasks(&self.cluster, batch).await? {
                let Some((definition, targets)) = scrape_targets(&task, &scrapable) else {
                    continue;
                };
                for target in targets {
                    groups.push(&definition.family, target);
                }
            }
        }

        Ok(groups.into_vec())
    }
}
