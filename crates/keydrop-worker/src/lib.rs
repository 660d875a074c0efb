//! Scheduled background tasks for Keydrop.
//!
//! This crate provides:
//! - A cron scheduler wrapping `tokio-cron-scheduler`
//! - The periodic view refresh job that bounds board staleness

pub mod jobs;
pub mod scheduler;

pub use jobs::ViewRefreshJob;
pub use scheduler::CronScheduler;
