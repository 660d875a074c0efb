//! Cron scheduler for periodic tasks.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use keydrop_core::config::WorkerConfig;
use keydrop_core::error::AppError;

use crate::jobs::ViewRefreshJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Register every task enabled in `config`.
    pub async fn register_default_tasks(
        &self,
        config: &WorkerConfig,
        view_refresh: ViewRefreshJob,
    ) -> Result<(), AppError> {
        self.register_view_refresh(&config.refresh_cron, view_refresh)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// View refresh on `expression`
    pub async fn register_view_refresh(
        &self,
        expression: &str,
        job: ViewRefreshJob,
    ) -> Result<(), AppError> {
        let cron = CronJob::new_async(expression, move |_uuid, _lock| {
            let job = job.clone();
            Box::pin(async move {
                tracing::debug!("Running scheduled view refresh");
                if let Err(e) = job.run().await {
                    tracing::error!("Scheduled view refresh failed: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid view refresh schedule '{expression}': {e}"
            ))
        })?;

        self.scheduler.add(cron).await.map_err(|e| {
            AppError::internal(format!("Failed to add view_refresh schedule: {e}"))
        })?;

        tracing::info!("Registered: view_refresh ({})", expression);
        Ok(())
    }
}
