pub mod campaign;
pub mod credential;
pub mod customer;
pub mod delivery;
pub mod health;
pub mod response;
pub mod retry;
pub mod schedule;
pub mod status;
pub mod template;
pub mod validation;
pub mod zns;
