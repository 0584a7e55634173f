use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    clients::{campaign_store::CampaignStore, credential::CredentialProvider},
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn CampaignStore>,
}

impl HealthChecker {
    pub fn new(credentials: Arc<dyn CredentialProvider>, store: Arc<dyn CampaignStore>) -> Self {
        Self { credentials, store }
    }

    pub async fn check_all(&self, pending_sends: usize) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("credential".to_string(), self.check_credential());
        checks.insert("campaign_store".to_string(), self.check_store().await);

        HealthCheckResponse {
            status: determine_overall_status(&checks),
            timestamp: Utc::now(),
            pending_sends,
            checks,
        }
    }

    // Sends fail without a token, but scheduling still works, so this only
    // degrades the service.
    fn check_credential(&self) -> ServiceHealth {
        match self.credentials.read_credential() {
            Ok(_) => ServiceHealth::healthy(0),
            Err(e) => {
                warn!(error = %e, "Credential health check failed");
                ServiceHealth::degraded(e.to_string())
            }
        }
    }

    async fn check_store(&self) -> ServiceHealth {
        let start = Instant::now();

        match self.store.health_check().await {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(response_time_ms = elapsed, "Campaign store health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Err(e) => {
                warn!(error = %e, "Campaign store health check failed");
                ServiceHealth::unhealthy(format!("Health check failed: {}", e))
            }
        }
    }
}

fn determine_overall_status(checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
    let has_unhealthy = checks
        .values()
        .any(|health| health.status == HealthStatus::Unhealthy);

    let has_degraded = checks
        .values()
        .any(|health| health.status == HealthStatus::Degraded);

    if has_unhealthy {
        HealthStatus::Unhealthy
    } else if has_degraded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
