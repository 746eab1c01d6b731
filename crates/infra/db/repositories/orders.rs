use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::orders::{InsertOrderEntity, OrderEntity, OrderRow},
    repositories::orders::OrderRepository,
    value_objects::enums::{order_statuses::OrderStatus, subscription_statuses::SubscriptionStatus},
};
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{orders, subscription_activations, subscriptions},
};

pub struct OrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderRepository for OrderPostgres {
    async fn issue_pending_order(&self, order: InsertOrderEntity) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = conn.transaction::<Option<OrderRow>, diesel::result::Error, _>(|conn| {
            // Row lock serializes concurrent issuance passes for the same subscription.
            let status = subscriptions::table
                .find(order.subscription_id)
                .select(subscriptions::status)
                .for_update()
                .first::<String>(conn)
                .optional()?;

            if status.as_deref() != Some(SubscriptionStatus::Active.as_str()) {
                return Ok(None);
            }

            let already_activated = subscription_activations::table
                .filter(subscription_activations::subscription_id.eq(order.subscription_id))
                .filter(subscription_activations::activation_date.ge(order.period_start))
                .filter(subscription_activations::activation_date.lt(order.period_end))
                .select(subscription_activations::id)
                .first::<Uuid>(conn)
                .optional()?;

            if already_activated.is_some() {
                return Ok(None);
            }

            let inserted = insert_into(orders::table)
                .values(&order)
                .on_conflict((orders::subscription_id, orders::period_start))
                .do_nothing()
                .returning(OrderRow::as_returning())
                .get_result::<OrderRow>(conn)
                .optional()?;

            let Some(inserted) = inserted else {
                return Ok(None);
            };

            update(subscriptions::table.find(order.subscription_id))
                .set((
                    subscriptions::status.eq(SubscriptionStatus::Pending.as_str()),
                    subscriptions::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(Some(inserted))
        })?;

        row.map(OrderEntity::try_from).transpose()
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = orders::table
            .find(order_id)
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .optional()?;

        row.map(OrderEntity::try_from).transpose()
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(orders::table.find(order_id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result::<OrderRow>(&mut conn)
            .optional()?;

        row.map(OrderEntity::try_from).transpose()
    }

    async fn list_by_subscription(&self, subscription_id: Uuid) -> Result<Vec<OrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = orders::table
            .filter(orders::subscription_id.eq(subscription_id))
            .order(orders::period_start.asc())
            .select(OrderRow::as_select())
            .load::<OrderRow>(&mut conn)?;

        rows.into_iter().map(OrderEntity::try_from).collect()
    }
}
