pub mod auth;
pub mod billing;
pub mod calls;
pub mod campaigns;
pub mod crm;
pub mod dashboard;
pub mod settings;
pub mod setup;
