//! ECS API interaction module
//!
//! This module wraps the parts of the Amazon ECS API needed for service
//! discovery: listing services and tasks, and describing services, task
//! definitions and tasks.
//!
//! # Module Structure
//!
//! - [`client`] - The [`EcsApi`](client::EcsApi) seam and its aws-sdk-ecs implementation
//! - [`types`] - Typed records converted from ECS API output shapes
//! - [`paginate`] - Turns token-based list calls into a lazy item stream
//! - [`batch`] - Groups a stream into fixed-size batches for describe calls
//!
//! # Example
//!
//! ```ignore
//! use fargate_sd::ecs::{client::EcsClient, paginate::paginate};
//! use aws_sdk_ecs::types::LaunchType;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = EcsClient::new(None, None).await?;
//!     let services = paginate(|token| client.list_services("prod", LaunchType::Fargate, token));
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod client;
pub mod paginate;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
