use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::orders::{InsertOrderEntity, OrderEntity},
    value_objects::enums::order_statuses::OrderStatus,
};

#[async_trait]
#[automock]
pub trait OrderRepository {
    /// Inserts a pending order and moves its subscription to `pending` as one atomic step.
    ///
    /// Serialized per subscription. Returns `None` without writing anything when the
    /// subscription is missing or no longer active, when an activation already falls inside the
    /// order's period, or when an order for the same period already exists.
    async fn issue_pending_order(&self, order: InsertOrderEntity) -> Result<Option<OrderEntity>>;

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderEntity>>;

    /// `None` when the order does not exist.
    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderEntity>>;

    async fn list_by_subscription(&self, subscription_id: Uuid) -> Result<Vec<OrderEntity>>;
}
