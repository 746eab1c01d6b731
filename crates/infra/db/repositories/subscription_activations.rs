use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::subscription_activations::{
        InsertSubscriptionActivationEntity, SubscriptionActivationEntity,
    },
    repositories::subscription_activations::SubscriptionActivationRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{subscription_activations, subscriptions},
};

pub struct SubscriptionActivationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionActivationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionActivationRepository for SubscriptionActivationPostgres {
    async fn find_in_period(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Option<SubscriptionActivationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let activation = subscription_activations::table
            .filter(subscription_activations::subscription_id.eq(subscription_id))
            .filter(subscription_activations::activation_date.ge(period_start))
            .filter(subscription_activations::activation_date.lt(period_end))
            .order(subscription_activations::activation_date.asc())
            .select(SubscriptionActivationEntity::as_select())
            .first::<SubscriptionActivationEntity>(&mut conn)
            .optional()?;

        Ok(activation)
    }

    async fn find_by_order_id(&self, order_id: Uuid) -> Result<Option<SubscriptionActivationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let activation = subscription_activations::table
            .filter(subscription_activations::order_id.eq(order_id))
            .select(SubscriptionActivationEntity::as_select())
            .first::<SubscriptionActivationEntity>(&mut conn)
            .optional()?;

        Ok(activation)
    }

    async fn activate_subscription(
        &self,
        activation: InsertSubscriptionActivationEntity,
    ) -> Result<Option<SubscriptionActivationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = conn
            .transaction::<Option<SubscriptionActivationEntity>, diesel::result::Error, _>(|conn| {
                let inserted = insert_into(subscription_activations::table)
                    .values(&activation)
                    .on_conflict(subscription_activations::order_id)
                    .do_nothing()
                    .returning(SubscriptionActivationEntity::as_returning())
                    .get_result::<SubscriptionActivationEntity>(conn)
                    .optional()?;

                if inserted.is_some() {
                    update(subscriptions::table.find(activation.subscription_id))
                        .set((
                            subscriptions::status.eq(SubscriptionStatus::Active.as_str()),
                            subscriptions::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                }

                Ok(inserted)
            })?;

        Ok(inserted)
    }

    async fn list_by_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<SubscriptionActivationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let activations = subscription_activations::table
            .filter(subscription_activations::subscription_id.eq(subscription_id))
            .order(subscription_activations::activation_date.asc())
            .select(SubscriptionActivationEntity::as_select())
            .load::<SubscriptionActivationEntity>(&mut conn)?;

        Ok(activations)
    }
}
