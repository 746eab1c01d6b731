use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscription_activations::{
    InsertSubscriptionActivationEntity, SubscriptionActivationEntity,
};

#[async_trait]
#[automock]
pub trait SubscriptionActivationRepository {
    /// First activation of the subscription whose `activation_date` is in `[period_start, period_end)`.
    async fn find_in_period(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Option<SubscriptionActivationEntity>>;

    async fn find_by_order_id(&self, order_id: Uuid) -> Result<Option<SubscriptionActivationEntity>>;

    /// Appends the activation and moves its subscription back to `active` as one atomic step.
    /// Returns `None` without writing anything when the order already has an activation.
    async fn activate_subscription(
        &self,
        activation: InsertSubscriptionActivationEntity,
    ) -> Result<Option<SubscriptionActivationEntity>>;

    async fn list_by_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<SubscriptionActivationEntity>>;
}
