pub mod account;
pub mod auth;
pub mod calls;
pub mod campaigns;
pub mod crm;
pub mod dashboard;
pub mod payments;
pub mod settings;
