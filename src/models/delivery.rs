use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{customer::Customer, status::DeliveryStatus, template::TemplateId};

/// Outcome of one send attempt for one customer. Stored verbatim in the
/// campaign history, so field names follow the stored document layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    #[serde(rename = "template")]
    pub template_id: TemplateId,
    pub name: String,
    pub phone: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub status: DeliveryStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn new(
        template_id: TemplateId,
        customer: &Customer,
        created_at: DateTime<Utc>,
        outcome: DeliveryOutcome,
    ) -> Self {
        Self {
            template_id,
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            created_at,
            status: outcome.status,
            error: outcome.error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

/// What the delivery client reports for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub message_id: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(message_id: Option<String>) -> Self {
        Self {
            status: DeliveryStatus::Success,
            error: None,
            message_id,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failure,
            error: Some(error.into()),
            message_id: None,
        }
    }
}
