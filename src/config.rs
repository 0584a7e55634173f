use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_zns_api_url")]
    pub zns_api_url: String,
    #[serde(default = "default_zns_token_file")]
    pub zns_token_file: String,
    #[serde(default = "default_zns_request_timeout_seconds")]
    pub zns_request_timeout_seconds: u64,

    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,

    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_campaign_key_prefix")]
    pub campaign_key_prefix: String,

    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub retry_backoff_multiplier: u64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.dispatch_concurrency == 0 {
            return Err(anyhow!("DISPATCH_CONCURRENCY must be at least 1"));
        }

        if self.max_retry_attempts == 0 {
            return Err(anyhow!("MAX_RETRY_ATTEMPTS must be at least 1"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zns_api_url: default_zns_api_url(),
            zns_token_file: default_zns_token_file(),
            zns_request_timeout_seconds: default_zns_request_timeout_seconds(),
            dispatch_concurrency: default_dispatch_concurrency(),
            redis_url: None,
            campaign_key_prefix: default_campaign_key_prefix(),
            max_retry_attempts: default_max_retry_attempts(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            retry_backoff_multiplier: default_retry_backoff_multiplier(),
            server_port: default_server_port(),
        }
    }
}

fn default_zns_api_url() -> String {
    "https://business.openapi.zalo.me/message/template".to_string()
}

fn default_zns_token_file() -> String {
    "zalo_token.json".to_string()
}

fn default_zns_request_timeout_seconds() -> u64 {
    10
}

fn default_dispatch_concurrency() -> usize {
    16
}

fn default_campaign_key_prefix() -> String {
    "campaign".to_string()
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    200
}

fn default_max_retry_delay_ms() -> u64 {
    2000
}

fn default_retry_backoff_multiplier() -> u64 {
    2
}

fn default_server_port() -> u16 {
    8080
}
