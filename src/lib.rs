//! Prometheus file-based service discovery for ECS Fargate tasks.
//!
//! Every cycle the scraper finds the cluster's ACTIVE services, keeps the task
//! definitions whose containers set the required environment variables
//! (`METRICS_PORT` by default), joins RUNNING tasks against them and writes
//! one target group per task definition family to a `file_sd_configs` file.

pub mod config;
pub mod discovery;
pub mod ecs;
pub mod lifecycle;
pub mod scraper;
pub mod snapshot;
