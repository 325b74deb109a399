pub mod account_repo;
pub use account_repo::AccountRepository;
pub mod call_repo;
pub use call_repo::CallRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod campaign_repo;
pub use campaign_repo::CampaignRepository;
