pub mod activations;
pub mod order_issuance;
pub mod plans;
pub mod subscriptions;
pub mod upgrade_price;
