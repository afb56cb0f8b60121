use std::time::Duration;

use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::errors::{CustomResult, Error};
use crate::modules::diagnostic::{run_diagnostic, StatusCell};
use crate::modules::models::api_token::ApiToken;
use crate::modules::models::general::DbPool;

const TOKEN_PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

fn scheduler_error(error: impl std::fmt::Debug) -> Error {
    Error::SchedulerError {
        reason: format!("{:?}", error),
    }
}

/// removes expired tokens, on a blocking thread
pub async fn prune_expired_tokens(pool: DbPool) {
    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|error| error.to_string())?;
        ApiToken::delete_expired(&mut conn).map_err(|error| error.to_string())
    })
    .await;

    match result {
        Ok(Ok(deleted)) => info!(target: "cron_jobs:prune_expired_tokens", "pruned {} tokens", deleted),
        Ok(Err(error)) => error!(target: "cron_jobs:prune_expired_tokens", "failed pruning tokens: {}", error),
        Err(error) => error!(target: "cron_jobs:prune_expired_tokens", "prune task panicked: {}", error),
    }
}

/// # start the background jobs
/// the diagnostic runs every `diagnostic_interval`, expired tokens are
/// pruned every hour. the scheduler is returned so it stays alive as long as
/// the caller keeps it.
///
/// ## Arguments
/// * `pool` - The database pool both jobs use
/// * `cell` - Where diagnostic runs store their outcome
/// * `health_url` - The health endpoint the diagnostic requests
/// * `diagnostic_interval` - Time between diagnostic runs
pub async fn register_cron_jobs(
    pool: DbPool,
    cell: StatusCell,
    health_url: String,
    diagnostic_interval: Duration,
) -> CustomResult<JobScheduler> {
    let scheduler = JobScheduler::new().await.map_err(scheduler_error)?;
    let client = crate::modules::diagnostic::http_client().map_err(scheduler_error)?;

    let diagnostic_pool = pool.clone();
    let diagnostic = Job::new_repeated_async(diagnostic_interval, move |_uuid, _l| {
        let pool = diagnostic_pool.clone();
        let client = client.clone();
        let url = health_url.clone();
        let cell = cell.clone();

        Box::pin(async move {
            run_diagnostic(&pool, &client, &url, &cell).await;
        })
    })
    .map_err(scheduler_error)?;

    let prune = Job::new_repeated_async(TOKEN_PRUNE_INTERVAL, move |_uuid, _l| {
        let pool = pool.clone();

        Box::pin(async move {
            prune_expired_tokens(pool).await;
        })
    })
    .map_err(scheduler_error)?;

    scheduler.add(diagnostic).await.map_err(scheduler_error)?;
    scheduler.add(prune).await.map_err(scheduler_error)?;
    scheduler.start().await.map_err(scheduler_error)?;

    info!(target: "cron_jobs:register_cron_jobs", "diagnostic every {}s, token pruning every {}s",
        diagnostic_interval.as_secs(), TOKEN_PRUNE_INTERVAL.as_secs());

    Ok(scheduler)
}
