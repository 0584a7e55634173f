use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{StreamExt, stream};
use tracing::{error, info, warn};

use crate::{
    clients::{
        campaign_store::CampaignStore, credential::CredentialProvider, template::TemplateResolver,
        zns::ZnsClient,
    },
    error::DispatchError,
    models::{
        campaign::CampaignId,
        credential::Credential,
        customer::Customer,
        delivery::{DeliveryOutcome, DeliveryResult},
        schedule::{BatchReport, BatchRequest, DispatchOutcome},
        template::TemplateId,
        validation::validate_customer,
    },
};

/// Receives the per-customer results of every batch that ran.
pub type CompletionCallback = Arc<dyn Fn(&BatchReport) + Send + Sync>;

/// Completion callback that only logs the batch summary.
pub fn log_completion() -> CompletionCallback {
    Arc::new(|report: &BatchReport| {
        info!(
            template_id = %report.template_id,
            campaign_id = report.campaign_id.as_ref().map(|id| id.as_str()).unwrap_or_default(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch completed"
        );
    })
}

#[async_trait]
pub trait BatchDispatch: Send + Sync {
    async fn dispatch_batch(
        &self,
        request: BatchRequest,
        on_complete: CompletionCallback,
    ) -> Result<DispatchOutcome, DispatchError>;
}

pub struct BatchDispatcher {
    credentials: Arc<dyn CredentialProvider>,
    templates: Arc<TemplateResolver>,
    client: ZnsClient,
    store: Arc<dyn CampaignStore>,
    concurrency: usize,
}

impl BatchDispatcher {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        templates: Arc<TemplateResolver>,
        client: ZnsClient,
        store: Arc<dyn CampaignStore>,
        concurrency: usize,
    ) -> Self {
        info!(concurrency, "Batch dispatcher initialized");

        Self {
            credentials,
            templates,
            client,
            store,
            concurrency: concurrency.max(1),
        }
    }

    async fn deliver(
        &self,
        template_id: &TemplateId,
        customer: &Customer,
        credential: &Credential,
    ) -> DeliveryResult {
        let sent_at = Utc::now();

        if let Err(e) = validate_customer(customer) {
            warn!(phone = %customer.phone, error = %e, "Skipping invalid customer");
            return DeliveryResult::new(
                template_id.clone(),
                customer,
                sent_at,
                DeliveryOutcome::failure(e.to_string()),
            );
        }

        let outcome = match self.templates.resolve(template_id, customer) {
            Ok(template_data) => {
                self.client
                    .send(template_id, template_data, customer, credential)
                    .await
            }
            Err(e) => DeliveryOutcome::failure(e.to_string()),
        };

        DeliveryResult::new(template_id.clone(), customer, sent_at, outcome)
    }

    async fn merge_into_campaign(
        &self,
        campaign_id: &CampaignId,
        results: &[DeliveryResult],
    ) -> Result<usize, DispatchError> {
        let persistence_error = |reason: String| DispatchError::Persistence {
            campaign_id: campaign_id.clone(),
            reason,
        };

        self.store
            .append_results(campaign_id, results.to_vec())
            .await
            .map_err(|e| persistence_error(e.to_string()))?
            .ok_or_else(|| persistence_error("campaign not found".to_string()))
    }
}

#[async_trait]
impl BatchDispatch for BatchDispatcher {
    async fn dispatch_batch(
        &self,
        request: BatchRequest,
        on_complete: CompletionCallback,
    ) -> Result<DispatchOutcome, DispatchError> {
        let credential = self.credentials.read_credential().map_err(|e| {
            error!(
                template_id = %request.template_id,
                customer_count = request.customers.len(),
                error = %e,
                "Batch aborted before sending"
            );
            e
        })?;

        info!(
            template_id = %request.template_id,
            customer_count = request.customers.len(),
            concurrency = self.concurrency,
            "Dispatching batch"
        );

        let template_id = &request.template_id;
        let credential = &credential;

        let deliveries: Vec<_> = request
            .customers
            .iter()
            .map(|customer| self.deliver(template_id, customer, credential))
            .collect();

        let results: Vec<DeliveryResult> = stream::iter(deliveries)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let persistence_error = match &request.campaign_id {
            Some(campaign_id) => match self.merge_into_campaign(campaign_id, &results).await {
                Ok(added) => {
                    info!(campaign_id = %campaign_id, added, "Campaign results updated");
                    None
                }
                Err(e) => {
                    warn!(campaign_id = %campaign_id, error = %e, "Failed to update campaign");
                    Some(e)
                }
            },
            None => None,
        };

        let report = BatchReport {
            template_id: request.template_id,
            campaign_id: request.campaign_id,
            results,
        };

        on_complete(&report);

        Ok(DispatchOutcome {
            report,
            persistence_error,
        })
    }
}
