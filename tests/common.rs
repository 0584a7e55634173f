use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use wiremock::MockServer;
use zns_dispatch::{
    clients::{
        campaign_store::InMemoryCampaignStore, credential::StaticCredentialProvider,
        template::TemplateResolver, zns::ZnsClient,
    },
    dispatcher::{BatchDispatch, BatchDispatcher, CompletionCallback},
    error::DispatchError,
    models::{
        customer::Customer,
        delivery::{DeliveryOutcome, DeliveryResult},
        schedule::{BatchReport, BatchRequest, DispatchOutcome},
    },
    scheduler::Clock,
};

pub const TEST_TOKEN: &str = "test-access-token";
pub const ZNS_PATH: &str = "/message/template";

pub type Reports = Arc<Mutex<Vec<BatchReport>>>;

pub fn customer(name: &str, phone: &str) -> Customer {
    Customer::new(name, phone)
}

pub fn customers(count: usize) -> Vec<Customer> {
    (0..count)
        .map(|i| customer(&format!("Customer {}", i), &format!("849{:08}", i)))
        .collect()
}

pub fn recording_callback() -> (CompletionCallback, Reports) {
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let callback: CompletionCallback = Arc::new(move |report: &BatchReport| {
        sink.lock().unwrap().push(report.clone());
    });
    (callback, reports)
}

pub fn zns_client(server: &MockServer, timeout: Duration) -> ZnsClient {
    ZnsClient::with_endpoint(format!("{}{}", server.uri(), ZNS_PATH), timeout).unwrap()
}

pub fn dispatcher(
    server: &MockServer,
    store: Arc<InMemoryCampaignStore>,
    concurrency: usize,
) -> BatchDispatcher {
    dispatcher_with(
        zns_client(server, Duration::from_secs(5)),
        StaticCredentialProvider::new(TEST_TOKEN),
        store,
        concurrency,
    )
}

pub fn dispatcher_with(
    client: ZnsClient,
    credentials: StaticCredentialProvider,
    store: Arc<InMemoryCampaignStore>,
    concurrency: usize,
) -> BatchDispatcher {
    BatchDispatcher::new(
        Arc::new(credentials),
        Arc::new(TemplateResolver::with_builtin_templates()),
        client,
        store,
        concurrency,
    )
}

pub fn zns_ok() -> serde_json::Value {
    serde_json::json!({
        "error": 0,
        "message": "Success",
        "data": { "msg_id": "a1b2c3", "sent_time": "1742461200000" }
    })
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 20, 8, 0, 0).unwrap()
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Stands in for the real dispatcher: records each batch and reports every
/// customer as delivered, or fails the batch when built with `failing`.
pub struct RecordingDispatcher {
    batches: mpsc::UnboundedSender<BatchRequest>,
    failure: Option<DispatchError>,
}

impl RecordingDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BatchRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                batches: tx,
                failure: None,
            },
            rx,
        )
    }

    pub fn failing(error: DispatchError) -> (Self, mpsc::UnboundedReceiver<BatchRequest>) {
        let (mut dispatcher, rx) = Self::new();
        dispatcher.failure = Some(error);
        (dispatcher, rx)
    }
}

#[async_trait]
impl BatchDispatch for RecordingDispatcher {
    async fn dispatch_batch(
        &self,
        request: BatchRequest,
        on_complete: CompletionCallback,
    ) -> Result<DispatchOutcome, DispatchError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let results = request
            .customers
            .iter()
            .map(|c| {
                DeliveryResult::new(
                    request.template_id.clone(),
                    c,
                    Utc::now(),
                    DeliveryOutcome::success(None),
                )
            })
            .collect();

        let report = BatchReport {
            template_id: request.template_id.clone(),
            campaign_id: request.campaign_id.clone(),
            results,
        };

        on_complete(&report);
        let _ = self.batches.send(request);

        Ok(DispatchOutcome {
            report,
            persistence_error: None,
        })
    }
}
