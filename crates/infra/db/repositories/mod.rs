pub mod orders;
pub mod plans;
pub mod subscription_activations;
pub mod subscriptions;
