pub mod billing_cycles;
pub mod order_statuses;
pub mod subscription_statuses;
