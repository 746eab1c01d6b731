pub mod config;
pub mod order_issuance;
