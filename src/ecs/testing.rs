//! In-memory [`EcsApi`] for unit tests

use super::batch::{SERVICES_BATCH_SIZE, TASKS_BATCH_SIZE};
use super::client::EcsApi;
use super::paginate::Page;
use super::types::*;
use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_ecs::types::{DesiredStatus, LaunchType};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn service(arn: &str, status: &str, task_definition: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        arn: arn.to_string(),
        status: status.into(),
        task_definition: Some(task_definition.to_string()),
    }
}

/// Task definition with one container per environment list
pub fn task_definition(arn: &str, family: &str, containers: &[&[(&str, &str)]]) -> TaskDefinitionDescriptor {
    TaskDefinitionDescriptor {
        arn: arn.to_string(),
        family: family.to_string(),
        containers: containers
            .iter()
            .enumerate()
            .map(|(i, environment)| ContainerDefinition {
                name: format!("container-{i}"),
                environment: environment
                    .iter()
                    .map(|(name, value)| KeyValue::new(*name, *value))
                    .collect(),
            })
            .collect(),
    }
}

pub fn eni(status: &str, address: &str) -> NetworkAttachment {
    NetworkAttachment {
        kind: AttachmentType::ElasticNetworkInterface,
        status: status.into(),
        details: vec![
            KeyValue::new("subnetId", "subnet-0abc"),
            KeyValue::new(NetworkAttachment::PRIVATE_IPV4_ADDRESS, address),
        ],
    }
}

pub fn task(task_definition_arn: &str, attachments: Vec<NetworkAttachment>) -> TaskDescriptor {
    TaskDescriptor {
        task_definition_arn: Some(task_definition_arn.to_string()),
        attachments,
    }
}

/// Scripted cluster contents served with small pages so pagination is exercised
pub struct FakeEcs {
    services: Vec<ServiceDescriptor>,
    task_definitions: HashMap<String, TaskDefinitionDescriptor>,
    tasks: Vec<(String, TaskDescriptor)>,
    page_size: usize,
    list_tasks_failures: Mutex<usize>,
    calls: Mutex<Vec<String>>,
}

impl Default for FakeEcs {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            task_definitions: HashMap::new(),
            tasks: Vec::new(),
            page_size: 3,
            list_tasks_failures: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeEcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: ServiceDescriptor) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_task_definition(mut self, definition: TaskDefinitionDescriptor) -> Self {
        self.task_definitions.insert(definition.arn.clone(), definition);
        self
    }

    pub fn with_task(mut self, task: TaskDescriptor) -> Self {
        let arn = format!("arn:aws:ecs:us-east-1:123456789012:task/prod/{}", self.tasks.len());
        self.tasks.push((arn, task));
        self
    }

    /// Make the next `count` `ListTasks` calls fail
    pub fn failing_list_tasks(self, count: usize) -> Self {
        *self.list_tasks_failures.lock().unwrap() = count;
        self
    }

    /// Operation names in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| *call == operation).count()
    }

    fn record(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }

    fn page(&self, arns: Vec<String>, next_token: Option<String>) -> Page<String> {
        let start: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(arns.len());
        let next = (end < arns.len()).then(|| end.to_string());
        Page::new(arns[start..end].to_vec(), next)
    }
}

#[async_trait]
impl EcsApi for FakeEcs {
    async fn list_services(
        &self,
        cluster: &str,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.record("ListServices");
        assert_eq!(cluster, "prod");
        assert_eq!(launch_type, LaunchType::Fargate);
        let arns = self.services.iter().map(|s| s.arn.clone()).collect();
        Ok(self.page(arns, next_token))
    }

    async fn describe_services(
        &self,
        cluster: &str,
        service_arns: Vec<String>,
    ) -> Result<Vec<ServiceDescriptor>> {
        self.record("DescribeServices");
        assert_eq!(cluster, "prod");
        assert!(!service_arns.is_empty() && service_arns.len() <= SERVICES_BATCH_SIZE);
        Ok(self
            .services
            .iter()
            .filter(|s| service_arns.contains(&s.arn))
            .cloned()
            .collect())
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        desired_status: DesiredStatus,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.record("ListTasks");
        {
            let mut failures = self.list_tasks_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                anyhow::bail!("ListTasks failed: ThrottlingException: Rate exceeded");
            }
        }
        assert_eq!(cluster, "prod");
        assert_eq!(desired_status, DesiredStatus::Running);
        assert_eq!(launch_type, LaunchType::Fargate);
        let arns = self.tasks.iter().map(|(arn, _)| arn.clone()).collect();
        Ok(self.page(arns, next_token))
    }

    async fn describe_task_definition(
        &self,
        task_definition_arn: &str,
    ) -> Result<Option<TaskDefinitionDescriptor>> {
        self.record("DescribeTaskDefinition");
        Ok(self.task_definitions.get(task_definition_arn).cloned())
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: Vec<String>,
    ) -> Result<Vec<TaskDescriptor>> {
        self.record("DescribeTasks");
        assert_eq!(cluster, "prod");
        assert!(!task_arns.is_empty() && task_arns.len() <= TASKS_BATCH_SIZE);
        Ok(self
            .tasks
            .iter()
            .filter(|(arn, _)| task_arns.contains(arn))
            .map(|(_, task)| task.clone())
            .collect())
    }
}
