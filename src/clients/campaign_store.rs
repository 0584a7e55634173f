use std::collections::HashMap;

use anyhow::{Error, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{
    campaign::{Campaign, CampaignId},
    delivery::DeliveryResult,
};

/// Persistence boundary for campaign result history. Calls may fail;
/// callers treat them as best-effort.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, Error>;

    /// Appends to the stored history in one atomic step, skipping results
    /// already recorded. Returns how many were added, or `None` when the
    /// campaign does not exist.
    async fn append_results(
        &self,
        id: &CampaignId,
        results: Vec<DeliveryResult>,
    ) -> Result<Option<usize>, Error>;

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCampaignStore {
    campaigns: RwLock<HashMap<CampaignId, Campaign>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, campaign: Campaign) {
        self.campaigns
            .write()
            .await
            .insert(campaign.id.clone(), campaign);
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, Error> {
        Ok(self.campaigns.read().await.get(id).cloned())
    }

    async fn append_results(
        &self,
        id: &CampaignId,
        results: Vec<DeliveryResult>,
    ) -> Result<Option<usize>, Error> {
        let mut campaigns = self.campaigns.write().await;

        Ok(campaigns
            .get_mut(id)
            .map(|campaign| campaign.append_results(results)))
    }
}
