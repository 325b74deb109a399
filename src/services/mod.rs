pub mod auth;
pub mod billing;
pub mod crm_sync;
pub mod ingestion;
pub mod subscription;
