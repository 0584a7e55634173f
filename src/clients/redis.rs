use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::MultiplexedConnection};
use tracing::{debug, info};

use crate::{
    clients::campaign_store::CampaignStore,
    config::Config,
    models::{
        campaign::{Campaign, CampaignId},
        delivery::DeliveryResult,
        retry::RetryConfig,
    },
    utils::retry_with_backoff,
};

/// Merges new results into the stored document server-side, so concurrent
/// batches for one campaign cannot overwrite each other. Returns -1 when the
/// campaign is missing, otherwise the number of results added.
const APPEND_RESULTS_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
    return -1
end

local campaign = cjson.decode(raw)
local stored = campaign.customer_results
if type(stored) ~= 'table' then
    stored = {}
end

local function result_key(r)
    return tostring(r.phone) .. '|' .. tostring(r.template) .. '|' .. tostring(r.createdAt)
end

local seen = {}
for _, r in ipairs(stored) do
    seen[result_key(r)] = true
end

local added = 0
for _, r in ipairs(cjson.decode(ARGV[1])) do
    local k = result_key(r)
    if not seen[k] then
        seen[k] = true
        table.insert(stored, r)
        added = added + 1
    end
end

if added > 0 then
    campaign.customer_results = stored
    redis.call('SET', KEYS[1], cjson.encode(campaign))
end

return added
"#;

/// Campaigns stored as JSON documents under `{prefix}:{id}`.
pub struct RedisCampaignStore {
    connection: MultiplexedConnection,
    key_prefix: String,
    retry_config: RetryConfig,
    append_script: Script,
}

impl RedisCampaignStore {
    pub async fn connect(redis_url: &str, config: &Config) -> Result<Self, Error> {
        info!("Connecting to Redis");

        let client =
            Client::open(redis_url).map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| anyhow!("Failed to connect to redis: {}", e))?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            key_prefix: config.campaign_key_prefix.clone(),
            retry_config: RetryConfig::from_config(config),
            append_script: Script::new(APPEND_RESULTS_SCRIPT),
        })
    }

    fn key(&self, id: &CampaignId) -> String {
        format!("{}:{}", self.key_prefix, id)
    }
}

#[async_trait]
impl CampaignStore for RedisCampaignStore {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, Error> {
        let mut conn = self.connection.clone();

        let value: Option<String> = conn
            .get(self.key(id))
            .await
            .map_err(|e| anyhow!("Failed to load campaign {}: {}", id, e))?;

        match value {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| {
                anyhow!("Stored campaign {} is not valid JSON: {}", id, e)
            })?)),
        }
    }

    async fn append_results(
        &self,
        id: &CampaignId,
        results: Vec<DeliveryResult>,
    ) -> Result<Option<usize>, Error> {
        if results.is_empty() {
            return Ok(self.find_by_id(id).await?.map(|_| 0));
        }

        let payload = serde_json::to_string(&results)?;
        let key = self.key(id);

        // The script dedupes, so a retried call never appends twice.
        let added: i64 = retry_with_backoff(&self.retry_config, || {
            let key_clone = key.clone();
            let payload_clone = payload.clone();
            let mut conn = self.connection.clone();

            async move {
                self.append_script
                    .key(&key_clone)
                    .arg(&payload_clone)
                    .invoke_async(&mut conn)
                    .await
                    .map_err(|e| e.to_string())
            }
        })
        .await
        .map_err(|e| anyhow!("Failed to append results to campaign {}: {}", id, e))?;

        if added < 0 {
            return Ok(None);
        }

        debug!(campaign_id = %id, added, "Campaign results appended");

        Ok(Some(added as usize))
    }

    async fn health_check(&self) -> Result<(), Error> {
        let mut conn = self.connection.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| anyhow!("Redis ping failed: {}", e))?;

        Ok(())
    }
}
