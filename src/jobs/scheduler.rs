use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::Instrument;

use super::store::{JobCompletion, JobStore};
use super::ScheduledJob;
use crate::contacts::NormalizedBatch;
use crate::engine::BulkSendEngine;
use crate::mail::TransportProvider;

/// Time source for the scheduler and for due-date checks.
///
/// Tests inject a manual implementation to drive jobs due without sleeping.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock [`Clock`].
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Periodic poller that claims due jobs and runs them through the bulk send
/// engine.
///
/// The loop is non-overlapping: one cycle runs to completion, then the full
/// poll interval elapses before the next fires. Within a cycle jobs are
/// processed sequentially, bounding open SMTP sessions and file handles and
/// keeping per-sender provider quotas simple. A failure in one job is
/// written to that job and never aborts the cycle or the loop.
///
/// Jobs left in `processing` by a crashed process are not resumed; they stay
/// there until operator intervention.
///
/// ```ignore
/// let handle = Scheduler::new(store, engine)
///     .poll_interval(Duration::from_secs(60))
///     .start();
/// // ...
/// handle.stop().await;
/// ```
#[derive(Clone)]
pub struct Scheduler<S: JobStore, P: TransportProvider> {
    store: S,
    engine: BulkSendEngine<P>,
    poll_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl<S: JobStore, P: TransportProvider> Scheduler<S, P> {
    pub fn new(store: S, engine: BulkSendEngine<P>) -> Self {
        Self {
            store,
            engine,
            poll_interval: Duration::from_secs(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// How long to wait between poll cycles (default: 60s).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replace the wall clock, for tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start the poll loop on a background tokio task.
    ///
    /// One cycle runs immediately so jobs already due are not delayed by a
    /// full interval. Returns a handle used for clean shutdown.
    pub fn start(&self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = self.clone();

        let join = tokio::spawn(async move {
            tracing::info!(interval = ?scheduler.poll_interval, "scheduler running");
            scheduler.run_cycle().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        tracing::info!("scheduler stopped");
                        break;
                    }
                    _ = tokio::time::sleep(scheduler.poll_interval) => {
                        scheduler.run_cycle().await;
                    }
                }
            }
        });

        SchedulerHandle { shutdown_tx, join }
    }

    /// Run one poll cycle: find due jobs, claim each, process it.
    ///
    /// Safe to invoke manually at any time — the atomic claim makes
    /// back-to-back cycles idempotent, each job is processed at most once.
    pub async fn run_cycle(&self) {
        let now = self.clock.now();
        let due = match self.store.find_due(now).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "failed to query due jobs");
                return;
            }
        };

        if due.is_empty() {
            tracing::debug!("no due jobs");
            return;
        }
        tracing::info!(count = due.len(), "processing due jobs");

        for job in due {
            let job_id = job.id;
            let claimed = match self.store.claim(job_id).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    tracing::debug!(%job_id, "job already claimed, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::error!(%job_id, error = %e, "claim failed");
                    continue;
                }
            };

            let span = tracing::info_span!("job", %job_id, sender = %claimed.from_email);
            self.process_job(claimed).instrument(span).await;
        }
    }

    async fn process_job(&self, job: ScheduledJob) {
        let batch = NormalizedBatch::from_rows(&job.recipients);

        let completion = match self
            .engine
            .send_bulk(&job.from_email, batch, &job.template, &job.attachments)
            .await
        {
            Ok(result) => {
                tracing::info!(recipients = result.len(), "job completed");
                JobCompletion::Sent {
                    result,
                    sent_at: self.clock.now(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "job failed");
                JobCompletion::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Err(e) = self.store.write_result(job.id, completion).await {
            tracing::error!(job_id = %job.id, error = %e, "failed to write job result");
        }
    }
}

/// Handle to a running [`Scheduler`] loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for the in-flight cycle to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }
}
