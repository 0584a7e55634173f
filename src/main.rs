use std::sync::Arc;

use anyhow::{Error, Result};
use tracing::{info, warn};
use zns_dispatch::{
    api::{AppState, run_api_server},
    clients::{
        campaign_store::{CampaignStore, InMemoryCampaignStore},
        credential::{CredentialProvider, FileCredentialProvider},
        health::HealthChecker,
        redis::RedisCampaignStore,
        template::TemplateResolver,
        zns::ZnsClient,
    },
    config::Config,
    dispatcher::{BatchDispatcher, log_completion},
    scheduler::{Scheduler, SystemClock},
    utils::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::load()?;

    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(FileCredentialProvider::new(&config.zns_token_file));
    let templates = Arc::new(TemplateResolver::with_builtin_templates());
    let client = ZnsClient::new(&config)?;

    let store: Arc<dyn CampaignStore> = match &config.redis_url {
        Some(redis_url) => Arc::new(RedisCampaignStore::connect(redis_url, &config).await?),
        None => {
            warn!("REDIS_URL not set, campaign results are kept in memory");
            Arc::new(InMemoryCampaignStore::new())
        }
    };

    let dispatcher = Arc::new(BatchDispatcher::new(
        Arc::clone(&credentials),
        Arc::clone(&templates),
        client,
        Arc::clone(&store),
        config.dispatch_concurrency,
    ));

    let scheduler = Arc::new(Scheduler::new(
        dispatcher,
        Arc::new(SystemClock),
        log_completion(),
    ));

    info!(templates = ?templates.template_ids(), "Dispatch service ready");

    let state = Arc::new(AppState::new(
        scheduler,
        templates,
        HealthChecker::new(credentials, store),
    ));

    run_api_server(&config, state).await
}
