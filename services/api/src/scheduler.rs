use staycompliant::workflows::compliance::{Clock, RecordStore, ReminderSender, ReminderSweep};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Six-field cron expression: every day at 08:00 local time.
pub(crate) const SWEEP_SCHEDULE: &str = "0 0 8 * * *";

/// Start the daily reminder sweep. The returned scheduler handle keeps the
/// job registered; the sweep itself reports per-permit outcomes through its
/// own tracing spans.
pub(crate) async fn start<S, N, C>(
    sweep: Arc<ReminderSweep<S, N, C>>,
) -> Result<JobScheduler, JobSchedulerError>
where
    S: RecordStore + 'static,
    N: ReminderSender + 'static,
    C: Clock + 'static,
{
    let sched = JobScheduler::new().await?;

    sched
        .add(Job::new_async(SWEEP_SCHEDULE, move |_uuid, _lock| {
            let sweep = sweep.clone();
            Box::pin(async move {
                let report = sweep.run();
                tracing::info!(
                    sent = report.sent,
                    skipped = report.skipped,
                    failed = report.failed,
                    "daily reminder sweep finished"
                );
            })
        })?)
        .await?;

    sched.start().await?;
    Ok(sched)
}
