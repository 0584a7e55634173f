use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::DispatchError,
    models::{
        campaign::CampaignId, customer::Customer, delivery::DeliveryResult,
        template::TemplateId,
    },
};

/// A request to send one template to a list of customers at `start_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(alias = "template")]
    pub template_id: TemplateId,
    pub customers: Vec<Customer>,

    #[serde(alias = "startAt")]
    pub start_at: DateTime<Utc>,

    #[serde(default, alias = "_id")]
    pub campaign_id: Option<CampaignId>,
}

impl ScheduleRequest {
    /// Request-level checks only. Bad customers become per-customer
    /// failures when the batch runs, and an empty list is a valid batch.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.template_id.as_str().trim().is_empty() {
            return Err(DispatchError::InvalidRequest(
                "Template id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn into_batch(self) -> BatchRequest {
        BatchRequest {
            template_id: self.template_id,
            customers: self.customers,
            campaign_id: self.campaign_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub template_id: TemplateId,
    pub customers: Vec<Customer>,
    pub campaign_id: Option<CampaignId>,
}

/// Per-customer results of one batch, handed to the completion callback.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub template_id: TemplateId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<CampaignId>,
    pub results: Vec<DeliveryResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub report: BatchReport,

    /// Set when merging into the campaign history failed. The report is
    /// still complete in that case.
    pub persistence_error: Option<DispatchError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSend {
    pub job_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<CampaignId>,
    pub template_id: TemplateId,
    pub customer_count: usize,
    pub fire_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    Dispatched(DispatchOutcome),
    Deferred(PendingSend),
}
