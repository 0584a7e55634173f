use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Duration as ChronoDuration;
use tokio::time::{sleep, timeout};
use zns_dispatch::{
    error::DispatchError,
    models::{
        campaign::CampaignId,
        schedule::{ScheduleOutcome, ScheduleRequest},
        template::TemplateId,
    },
    scheduler::Scheduler,
};

use crate::common::{FixedClock, RecordingDispatcher, customers, fixed_time, recording_callback};

fn request(offset: ChronoDuration, campaign: Option<&str>, customer_count: usize) -> ScheduleRequest {
    ScheduleRequest {
        template_id: TemplateId::from("366532"),
        customers: customers(customer_count),
        start_at: fixed_time() + offset,
        campaign_id: campaign.map(CampaignId::from),
    }
}

fn scheduler(dispatcher: RecordingDispatcher) -> (Scheduler, crate::common::Reports) {
    let (callback, reports) = recording_callback();
    let scheduler = Scheduler::new(
        Arc::new(dispatcher),
        Arc::new(FixedClock(fixed_time())),
        callback,
    );
    (scheduler, reports)
}

/// Test: A start time in the past dispatches before schedule_send returns
#[tokio::test(start_paused = true)]
async fn test_past_start_dispatches_immediately() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, reports) = scheduler(dispatcher);

    let outcome = scheduler
        .schedule_send(request(-ChronoDuration::minutes(5), Some("c-1"), 2))
        .await?;

    match outcome {
        ScheduleOutcome::Dispatched(outcome) => assert_eq!(outcome.report.results.len(), 2),
        other => panic!("expected immediate dispatch, got {:?}", other),
    }

    assert_eq!(reports.lock().unwrap().len(), 1, "Callback should have fired");
    assert!(batches.try_recv().is_ok());
    assert!(scheduler.list_pending().is_empty());

    Ok(())
}

/// Test: A start time equal to now is treated as due
#[tokio::test(start_paused = true)]
async fn test_present_start_dispatches_immediately() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, _) = scheduler(dispatcher);

    let outcome = scheduler
        .schedule_send(request(ChronoDuration::zero(), None, 1))
        .await?;

    assert!(matches!(outcome, ScheduleOutcome::Dispatched(_)));
    assert!(batches.try_recv().is_ok());

    Ok(())
}

/// Test: A start time one hour ahead defers the send until that instant
#[tokio::test(start_paused = true)]
async fn test_future_start_is_deferred_until_fire_time() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, reports) = scheduler(dispatcher);

    let outcome = scheduler
        .schedule_send(request(ChronoDuration::hours(1), Some("c-1"), 3))
        .await?;

    let pending = match outcome {
        ScheduleOutcome::Deferred(pending) => pending,
        other => panic!("expected deferred send, got {:?}", other),
    };
    assert_eq!(pending.fire_at, fixed_time() + ChronoDuration::hours(1));
    assert_eq!(pending.campaign_id, Some(CampaignId::from("c-1")));
    assert_eq!(pending.customer_count, 3);
    assert_eq!(scheduler.list_pending(), vec![pending.clone()]);

    sleep(Duration::from_secs(3599)).await;
    assert!(batches.try_recv().is_err(), "Nothing should be sent before the trigger");
    assert!(reports.lock().unwrap().is_empty());

    let batch = timeout(Duration::from_secs(5), batches.recv())
        .await?
        .expect("deferred batch dispatched");

    assert_eq!(batch.customers.len(), 3);
    assert_eq!(batch.campaign_id, Some(CampaignId::from("c-1")));
    assert_eq!(reports.lock().unwrap().len(), 1);
    assert!(scheduler.list_pending().is_empty(), "Fired job leaves the pending list");

    Ok(())
}

/// Test: Cancelling before the trigger stops the send
#[tokio::test(start_paused = true)]
async fn test_cancel_before_fire() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, _) = scheduler(dispatcher);
    let campaign_id = CampaignId::from("c-2");

    scheduler
        .schedule_send(request(ChronoDuration::minutes(30), Some("c-2"), 2))
        .await?;

    let cancelled = scheduler.cancel(&campaign_id).expect("pending send exists");
    assert_eq!(cancelled.campaign_id, Some(campaign_id.clone()));
    assert!(scheduler.list_pending().is_empty());
    assert!(scheduler.cancel(&campaign_id).is_none(), "Second cancel finds nothing");

    sleep(Duration::from_secs(2 * 3600)).await;
    assert!(batches.try_recv().is_err());

    Ok(())
}

/// Test: Rescheduling a campaign replaces its pending send
#[tokio::test(start_paused = true)]
async fn test_reschedule_replaces_previous_job() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, _) = scheduler(dispatcher);

    scheduler
        .schedule_send(request(ChronoDuration::minutes(10), Some("c-3"), 1))
        .await?;
    scheduler
        .schedule_send(request(ChronoDuration::minutes(20), Some("c-3"), 4))
        .await?;

    let pending = scheduler.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].customer_count, 4);

    let batch = timeout(Duration::from_secs(30 * 60), batches.recv())
        .await?
        .expect("replacement batch dispatched");
    assert_eq!(batch.customers.len(), 4);

    sleep(Duration::from_secs(3600)).await;
    assert!(batches.try_recv().is_err(), "Replaced job must not fire");

    Ok(())
}

/// Test: Sends without a campaign are listed and cancellable by job id
#[tokio::test(start_paused = true)]
async fn test_jobs_without_campaign_are_tracked() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, _) = scheduler(dispatcher);

    scheduler
        .schedule_send(request(ChronoDuration::hours(2), None, 1))
        .await?;
    let outcome = scheduler
        .schedule_send(request(ChronoDuration::hours(1), None, 2))
        .await?;

    let job_id = match outcome {
        ScheduleOutcome::Deferred(pending) => pending.job_id,
        other => panic!("expected deferred send, got {:?}", other),
    };

    let pending = scheduler.list_pending();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].job_id, job_id, "Pending sends are ordered by fire time");

    assert!(scheduler.cancel_job(job_id).is_some());
    assert_eq!(scheduler.list_pending().len(), 1);

    let batch = timeout(Duration::from_secs(3 * 3600), batches.recv())
        .await?
        .expect("remaining job fires");
    assert_eq!(batch.customers.len(), 1);

    Ok(())
}

/// Test: Invalid requests are rejected without dispatching or scheduling
#[tokio::test(start_paused = true)]
async fn test_invalid_request_is_rejected() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, _) = scheduler(dispatcher);

    let mut invalid = request(ChronoDuration::hours(1), Some("c-4"), 2);
    invalid.template_id = TemplateId::from("");

    let result = scheduler.schedule_send(invalid).await;

    assert!(matches!(result, Err(DispatchError::InvalidRequest(_))));
    assert!(scheduler.list_pending().is_empty());
    assert!(batches.try_recv().is_err());

    Ok(())
}

/// Test: An empty customer list still runs and fires the callback with no results
#[tokio::test(start_paused = true)]
async fn test_empty_batch_fires_callback() -> Result<()> {
    let (dispatcher, mut batches) = RecordingDispatcher::new();
    let (scheduler, reports) = scheduler(dispatcher);

    let outcome = scheduler
        .schedule_send(request(-ChronoDuration::minutes(1), Some("c-9"), 0))
        .await?;

    match outcome {
        ScheduleOutcome::Dispatched(outcome) => assert!(outcome.report.results.is_empty()),
        other => panic!("expected immediate dispatch, got {:?}", other),
    }

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].results.is_empty());
    assert!(batches.try_recv()?.customers.is_empty());

    Ok(())
}

/// Test: Batch-level failures surface from the immediate path
#[tokio::test(start_paused = true)]
async fn test_immediate_credential_failure_is_returned() -> Result<()> {
    let (dispatcher, _batches) = RecordingDispatcher::failing(
        DispatchError::CredentialUnavailable("token file missing".to_string()),
    );
    let (scheduler, reports) = scheduler(dispatcher);

    let result = scheduler
        .schedule_send(request(-ChronoDuration::seconds(1), None, 2))
        .await;

    assert!(matches!(result, Err(DispatchError::CredentialUnavailable(_))));
    assert!(reports.lock().unwrap().is_empty());

    Ok(())
}
