use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    dispatcher::{BatchDispatch, CompletionCallback},
    error::DispatchError,
    models::{
        campaign::CampaignId,
        schedule::{BatchRequest, PendingSend, ScheduleOutcome, ScheduleRequest},
    },
};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct ScheduledJob {
    pending: PendingSend,
    task: JoinHandle<()>,
}

type JobMap = Mutex<HashMap<Uuid, ScheduledJob>>;

/// Runs batches now or at an absolute instant. Deferred jobs live only in
/// this process; nothing survives a restart.
pub struct Scheduler {
    dispatcher: Arc<dyn BatchDispatch>,
    clock: Arc<dyn Clock>,
    on_complete: CompletionCallback,
    jobs: Arc<JobMap>,
}

impl Scheduler {
    pub fn new(
        dispatcher: Arc<dyn BatchDispatch>,
        clock: Arc<dyn Clock>,
        on_complete: CompletionCallback,
    ) -> Self {
        Self {
            dispatcher,
            clock,
            on_complete,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Dispatches inline when `start_at` is not in the future, otherwise
    /// registers a one-shot job and returns without sending anything.
    pub async fn schedule_send(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleOutcome, DispatchError> {
        request.validate()?;

        let now = self.clock.now();

        if request.start_at <= now {
            info!(
                template_id = %request.template_id,
                customer_count = request.customers.len(),
                "Start time reached, dispatching immediately"
            );

            let outcome = self
                .dispatcher
                .dispatch_batch(request.into_batch(), Arc::clone(&self.on_complete))
                .await?;

            return Ok(ScheduleOutcome::Dispatched(outcome));
        }

        let delay = (request.start_at - now).to_std().unwrap_or_default();

        Ok(ScheduleOutcome::Deferred(self.defer(request, delay)))
    }

    fn defer(&self, request: ScheduleRequest, delay: Duration) -> PendingSend {
        let pending = PendingSend {
            job_id: Uuid::new_v4(),
            campaign_id: request.campaign_id.clone(),
            template_id: request.template_id.clone(),
            customer_count: request.customers.len(),
            fire_at: request.start_at,
        };

        let mut jobs = lock(&self.jobs);

        // One live job per campaign: the newer request wins.
        if let Some(campaign_id) = &pending.campaign_id {
            if let Some(previous) = take_campaign_job(&mut jobs, campaign_id) {
                previous.task.abort();
                info!(
                    campaign_id = %campaign_id,
                    replaced_job_id = %previous.pending.job_id,
                    "Replaced pending send for campaign"
                );
            }
        }

        let task = tokio::spawn(run_job(
            pending.job_id,
            delay,
            request.into_batch(),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.on_complete),
            Arc::clone(&self.jobs),
        ));

        jobs.insert(
            pending.job_id,
            ScheduledJob {
                pending: pending.clone(),
                task,
            },
        );

        info!(
            job_id = %pending.job_id,
            template_id = %pending.template_id,
            fire_at = %pending.fire_at,
            delay_secs = delay.as_secs(),
            "Send scheduled"
        );

        pending
    }

    /// Cancels the pending send of a campaign. Returns `None` when nothing is
    /// pending, including when the job has already fired.
    pub fn cancel(&self, campaign_id: &CampaignId) -> Option<PendingSend> {
        let job = take_campaign_job(&mut lock(&self.jobs), campaign_id)?;
        job.task.abort();

        info!(campaign_id = %campaign_id, job_id = %job.pending.job_id, "Pending send cancelled");

        Some(job.pending)
    }

    pub fn cancel_job(&self, job_id: Uuid) -> Option<PendingSend> {
        let job = lock(&self.jobs).remove(&job_id)?;
        job.task.abort();

        info!(job_id = %job_id, "Pending send cancelled");

        Some(job.pending)
    }

    pub fn list_pending(&self) -> Vec<PendingSend> {
        let mut pending: Vec<PendingSend> = lock(&self.jobs)
            .values()
            .map(|job| job.pending.clone())
            .collect();
        pending.sort_by_key(|p| p.fire_at);
        pending
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for (_, job) in lock(&self.jobs).drain() {
            job.task.abort();
        }
    }
}

fn lock(jobs: &JobMap) -> MutexGuard<'_, HashMap<Uuid, ScheduledJob>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_campaign_job(
    jobs: &mut HashMap<Uuid, ScheduledJob>,
    campaign_id: &CampaignId,
) -> Option<ScheduledJob> {
    let job_id = jobs
        .iter()
        .find(|(_, job)| job.pending.campaign_id.as_ref() == Some(campaign_id))
        .map(|(job_id, _)| *job_id)?;

    jobs.remove(&job_id)
}

async fn run_job(
    job_id: Uuid,
    delay: Duration,
    batch: BatchRequest,
    dispatcher: Arc<dyn BatchDispatch>,
    on_complete: CompletionCallback,
    jobs: Arc<JobMap>,
) {
    tokio::time::sleep(delay).await;

    // Leaving the map first means a late cancel cannot race the send.
    if lock(&jobs).remove(&job_id).is_none() {
        return;
    }

    info!(job_id = %job_id, template_id = %batch.template_id, "Deferred send firing");

    if let Err(e) = dispatcher.dispatch_batch(batch, on_complete).await {
        error!(job_id = %job_id, error = %e, "Deferred send failed");
    }
}
