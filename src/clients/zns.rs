use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    error::DispatchError,
    models::{
        credential::Credential,
        customer::Customer,
        delivery::DeliveryOutcome,
        template::{TemplateFields, TemplateId},
        zns::{ZnsRequest, ZnsResponse},
    },
};

/// Sends template messages to the ZNS endpoint. One request per call, no
/// retries; every failure mode is folded into a [`DeliveryOutcome`].
#[derive(Clone)]
pub struct ZnsClient {
    http_client: Client,
    api_url: String,
}

impl ZnsClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_endpoint(
            config.zns_api_url.clone(),
            Duration::from_secs(config.zns_request_timeout_seconds),
        )
    }

    pub fn with_endpoint(api_url: String, timeout: Duration) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        info!(api_url = %api_url, "ZNS client initialized");

        Ok(Self {
            http_client,
            api_url,
        })
    }

    pub async fn send(
        &self,
        template_id: &TemplateId,
        template_data: TemplateFields,
        customer: &Customer,
        credential: &Credential,
    ) -> DeliveryOutcome {
        let request = ZnsRequest {
            phone: customer.phone.clone(),
            template_id: template_id.clone(),
            template_data,
            tracking_id: Uuid::new_v4().to_string(),
        };

        debug!(
            phone = %request.phone,
            template_id = %template_id,
            tracking_id = %request.tracking_id,
            "Sending ZNS message"
        );

        match self.send_once(&request, credential).await {
            Ok(response) => {
                let message_id = response.data.and_then(|d| d.msg_id);
                info!(
                    phone = %request.phone,
                    template_id = %template_id,
                    msg_id = message_id.as_deref().unwrap_or_default(),
                    "ZNS message sent successfully"
                );
                DeliveryOutcome::success(message_id)
            }
            Err(e) => {
                warn!(
                    phone = %request.phone,
                    template_id = %template_id,
                    error = %e,
                    "ZNS message failed"
                );
                DeliveryOutcome::failure(e.to_string())
            }
        }
    }

    async fn send_once(
        &self,
        request: &ZnsRequest,
        credential: &Credential,
    ) -> Result<ZnsResponse, DispatchError> {
        let delivery_error = |reason: String| DispatchError::Delivery {
            phone: request.phone.clone(),
            reason,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .header("access_token", &credential.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| delivery_error(format!("request error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(delivery_error(format!(
                "provider returned HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ZnsResponse = response
            .json()
            .await
            .map_err(|e| delivery_error(format!("unreadable provider response: {}", e)))?;

        if body.is_success() {
            Ok(body)
        } else {
            Err(delivery_error(format!(
                "provider error {}: {}",
                body.error,
                body.message.unwrap_or_default()
            )))
        }
    }
}
