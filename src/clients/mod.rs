pub mod campaign_store;
pub mod credential;
pub mod health;
pub mod redis;
pub mod template;
pub mod zns;
