use thiserror::Error;

use crate::models::{campaign::CampaignId, template::TemplateId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("No resolver registered for template {0}")]
    UnknownTemplate(TemplateId),

    #[error("Delivery to {phone} failed: {reason}")]
    Delivery { phone: String, reason: String },

    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("Failed to persist results for campaign {campaign_id}: {reason}")]
    Persistence {
        campaign_id: CampaignId,
        reason: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
