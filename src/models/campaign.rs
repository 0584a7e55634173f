use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{delivery::DeliveryResult, template::TemplateId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CampaignId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CampaignId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,

    #[serde(default)]
    pub customer_results: Vec<DeliveryResult>,
}

impl Campaign {
    pub fn new(id: CampaignId) -> Self {
        Self {
            id,
            customer_results: Vec::new(),
        }
    }

    /// Appends results after the existing history. A result whose
    /// (phone, template, createdAt) is already recorded is skipped, so
    /// replaying the same batch is harmless. Returns how many were added.
    pub fn append_results(&mut self, results: impl IntoIterator<Item = DeliveryResult>) -> usize {
        let mut seen: HashSet<(String, TemplateId, DateTime<Utc>)> = self
            .customer_results
            .iter()
            .map(|r| (r.phone.clone(), r.template_id.clone(), r.created_at))
            .collect();

        let before = self.customer_results.len();

        for result in results {
            let key = (result.phone.clone(), result.template_id.clone(), result.created_at);
            if seen.insert(key) {
                self.customer_results.push(result);
            }
        }

        self.customer_results.len() - before
    }
}
