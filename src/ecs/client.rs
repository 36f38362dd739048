//! ECS Client
//!
//! [`EcsApi`] is the query surface the discovery pipeline depends on.
//! [`EcsClient`] implements it on top of aws-sdk-ecs, converting SDK output
//! shapes into the records in [`super::types`].

use super::paginate::Page;
use super::types::{ServiceDescriptor, TaskDefinitionDescriptor, TaskDescriptor};
use anyhow::{bail, Result};
use async_trait::async_trait;
use aws_sdk_ecs::config::Region;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{DesiredStatus, LaunchType};
use std::sync::Arc;

/// Read-only ECS queries used by service discovery
#[async_trait]
pub trait EcsApi: Send + Sync {
    /// One page of service ARNs in `cluster` for the given launch type
    async fn list_services(
        &self,
        cluster: &str,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Describe up to [`SERVICES_BATCH_SIZE`](super::batch::SERVICES_BATCH_SIZE) services
    async fn describe_services(
        &self,
        cluster: &str,
        service_arns: Vec<String>,
    ) -> Result<Vec<ServiceDescriptor>>;

    /// One page of task ARNs in `cluster` with the given desired status and launch type
    async fn list_tasks(
        &self,
        cluster: &str,
        desired_status: DesiredStatus,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Describe one task definition. `None` when the response carries no definition.
    async fn describe_task_definition(
        &self,
        task_definition_arn: &str,
    ) -> Result<Option<TaskDefinitionDescriptor>>;

    /// Describe up to [`TASKS_BATCH_SIZE`](super::batch::TASKS_BATCH_SIZE) tasks
    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: Vec<String>,
    ) -> Result<Vec<TaskDescriptor>>;
}

#[async_trait]
impl<T: EcsApi + ?Sized> EcsApi for Arc<T> {
    async fn list_services(
        &self,
        cluster: &str,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        (**self).list_services(cluster, launch_type, next_token).await
    }

    async fn describe_services(
        &self,
        cluster: &str,
        service_arns: Vec<String>,
    ) -> Result<Vec<ServiceDescriptor>> {
        (**self).describe_services(cluster, service_arns).await
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        desired_status: DesiredStatus,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        (**self)
            .list_tasks(cluster, desired_status, launch_type, next_token)
            .await
    }

    async fn describe_task_definition(
        &self,
        task_definition_arn: &str,
    ) -> Result<Option<TaskDefinitionDescriptor>> {
        (**self).describe_task_definition(task_definition_arn).await
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: Vec<String>,
    ) -> Result<Vec<TaskDescriptor>> {
        (**self).describe_tasks(cluster, task_arns).await
    }
}

/// ECS client backed by aws-sdk-ecs
#[derive(Clone)]
pub struct EcsClient {
    inner: aws_sdk_ecs::Client,
}

impl EcsClient {
    /// Create a client from the default AWS configuration chain (environment,
    /// profile, container or instance credentials).
    ///
    /// `region` overrides the configured region and `endpoint_url` points the
    /// client at a different ECS endpoint, such as a local emulator.
    pub async fn new(region: Option<&str>, endpoint_url: Option<&str>) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        let Some(region) = sdk_config.region() else {
            bail!("No AWS region configured. Set AWS_REGION or use --region flag");
        };
        tracing::info!("Using AWS region: {}", region);

        let mut builder = aws_sdk_ecs::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = endpoint_url {
            tracing::info!("Using ECS endpoint: {}", endpoint_url);
            builder = builder.endpoint_url(endpoint_url);
        }

        Ok(Self::from_conf(builder.build()))
    }

    /// Create a client from an explicit SDK configuration
    pub fn from_conf(config: aws_sdk_ecs::Config) -> Self {
        Self {
            inner: aws_sdk_ecs::Client::from_conf(config),
        }
    }
}

/// Render an SDK error with its full cause chain
fn sdk_error<E>(operation: &str, err: E) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    anyhow::anyhow!("{} failed: {}", operation, DisplayErrorContext(err))
}

#[async_trait]
impl EcsApi for EcsClient {
    async fn list_services(
        &self,
        cluster: &str,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        tracing::debug!("ListServices cluster={} token={:?}", cluster, next_token);

        let output = self
            .inner
            .list_services()
            .cluster(cluster)
            .launch_type(launch_type)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("ListServices", e))?;

        Ok(Page::new(
            output.service_arns().to_vec(),
            output.next_token().map(str::to_string),
        ))
    }

    async fn describe_services(
        &self,
        cluster: &str,
        service_arns: Vec<String>,
    ) -> Result<Vec<ServiceDescriptor>> {
        tracing::debug!("DescribeServices cluster={} count={}", cluster, service_arns.len());

        let output = self
            .inner
            .describe_services()
            .cluster(cluster)
            .set_services(Some(service_arns))
            .send()
            .await
            .map_err(|e| sdk_error("DescribeServices", e))?;

        Ok(output.services().iter().map(ServiceDescriptor::from).collect())
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        desired_status: DesiredStatus,
        launch_type: LaunchType,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        tracing::debug!("ListTasks cluster={} token={:?}", cluster, next_token);

        let output = self
            .inner
            .list_tasks()
            .cluster(cluster)
            .desired_status(desired_status)
            .launch_type(launch_type)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| sdk_error("ListTasks", e))?;

        Ok(Page::new(
            output.task_arns().to_vec(),
            output.next_token().map(str::to_string),
        ))
    }

    async fn describe_task_definition(
        &self,
        task_definition_arn: &str,
    ) -> Result<Option<TaskDefinitionDescriptor>> {
        tracing::debug!("DescribeTaskDefinition {}", task_definition_arn);

        let output = self
            .inner
            .describe_task_definition()
            .task_definition(task_definition_arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeTaskDefinition", e))?;

        Ok(output.task_definition().map(TaskDefinitionDescriptor::from))
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: Vec<String>,
    ) -> Result<Vec<TaskDescriptor>> {
        tracing::debug!("DescribeTasks cluster={} count={}", cluster, task_arns.len());

        let output = self
            .inner
            .describe_tasks()
            .cluster(cluster)
            .set_tasks(Some(task_arns))
            .send()
            .await
            .map_err(|e| sdk_error("DescribeTasks", e))?;

        Ok(output.tasks().iter().map(TaskDescriptor::from).collect())
    }
}
