//! ECS Records
//!
//! Typed views of the ECS API output shapes the discovery pipeline reads.
//! Optional fields missing from a response become empty values here, and the
//! pipeline treats empty values as "not scrapable" rather than as errors.

use aws_sdk_ecs::types as sdk;

/// Service status as reported by `DescribeServices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Active,
    Other(String),
}

impl From<&str> for ServiceStatus {
    fn from(value: &str) -> Self {
        match value {
            "ACTIVE" => Self::Active,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A deployed ECS service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub arn: String,
    pub status: ServiceStatus,
    /// ARN of the task definition the service currently deploys
    pub task_definition: Option<String>,
}

impl ServiceDescriptor {
    pub fn is_active(&self) -> bool {
        self.status == ServiceStatus::Active
    }
}

impl From<&sdk::Service> for ServiceDescriptor {
    fn from(service: &sdk::Service) -> Self {
        Self {
            arn: service.service_arn().unwrap_or_default().to_string(),
            status: service.status().unwrap_or_default().into(),
            task_definition: service
                .task_definition()
                .filter(|arn| !arn.is_empty())
                .map(str::to_string),
        }
    }
}

/// A name/value pair, used for both container environment entries and
/// attachment details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub name: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<&sdk::KeyValuePair> for KeyValue {
    fn from(pair: &sdk::KeyValuePair) -> Self {
        Self::new(
            pair.name().unwrap_or_default(),
            pair.value().unwrap_or_default(),
        )
    }
}

/// One container of a task definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerDefinition {
    pub name: String,
    /// Environment configured on the container in the task definition.
    /// This is the task's environment, not the environment of this process.
    pub environment: Vec<KeyValue>,
}

impl From<&sdk::ContainerDefinition> for ContainerDefinition {
    fn from(container: &sdk::ContainerDefinition) -> Self {
        Self {
            name: container.name().unwrap_or_default().to_string(),
            environment: container.environment().iter().map(KeyValue::from).collect(),
        }
    }
}

/// A task definition revision
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDefinitionDescriptor {
    pub arn: String,
    pub family: String,
    pub containers: Vec<ContainerDefinition>,
}

impl From<&sdk::TaskDefinition> for TaskDefinitionDescriptor {
    fn from(definition: &sdk::TaskDefinition) -> Self {
        Self {
            arn: definition.task_definition_arn().unwrap_or_default().to_string(),
            family: definition.family().unwrap_or_default().to_string(),
            containers: definition
                .container_definitions()
                .iter()
                .map(ContainerDefinition::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentType {
    ElasticNetworkInterface,
    Other(String),
}

impl From<&str> for AttachmentType {
    fn from(value: &str) -> Self {
        match value {
            "ElasticNetworkInterface" => Self::ElasticNetworkInterface,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentStatus {
    Attached,
    Other(String),
}

impl From<&str> for AttachmentStatus {
    fn from(value: &str) -> Self {
        match value {
            "ATTACHED" => Self::Attached,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A resource bound to a running task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub kind: AttachmentType,
    pub status: AttachmentStatus,
    pub details: Vec<KeyValue>,
}

impl NetworkAttachment {
    /// Detail key carrying the interface's private address
    pub const PRIVATE_IPV4_ADDRESS: &'static str = "privateIPv4Address";

    /// Whether this is an elastic network interface that is currently attached
    pub fn is_attached_eni(&self) -> bool {
        self.kind == AttachmentType::ElasticNetworkInterface
            && self.status == AttachmentStatus::Attached
    }

    /// Every `privateIPv4Address` value listed in the details, in order
    pub fn private_ipv4_addresses(&self) -> impl Iterator<Item = &str> {
        self.details
            .iter()
            .filter(|detail| detail.name == Self::PRIVATE_IPV4_ADDRESS)
            .map(|detail| detail.value.as_str())
    }
}

impl From<&sdk::Attachment> for NetworkAttachment {
    fn from(attachment: &sdk::Attachment) -> Self {
        Self {
            kind: attachment.r#type().unwrap_or_default().into(),
            status: attachment.status().unwrap_or_default().into(),
            details: attachment.details().iter().map(KeyValue::from).collect(),
        }
    }
}

/// A running task instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDescriptor {
    pub task_definition_arn: Option<String>,
    pub attachments: Vec<NetworkAttachment>,
}

impl TaskDescriptor {
    /// Private addresses of all attached elastic network interfaces
    pub fn private_addresses(&self) -> impl Iterator<Item = &str> {
        self.attachments
            .iter()
            .filter(|attachment| attachment.is_attached_eni())
            .flat_map(|attachment| attachment.private_ipv4_addresses())
    }
}

impl From<&sdk::Task> for TaskDescriptor {
    fn from(task: &sdk::Task) -> Self {
        Self {
            task_definition_arn: task
                .task_definition_arn()
                .filter(|arn| !arn.is_empty())
                .map(str::to_string),
            attachments: task.attachments().iter().map(NetworkAttachment::from).collect(),
        }
    }
}
