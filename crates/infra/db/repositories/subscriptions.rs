use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity, SubscriptionRow},
    repositories::subscriptions::SubscriptionRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn create_subscription(
        &self,
        subscription: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(subscriptions::table)
            .values(&subscription)
            .returning(SubscriptionRow::as_returning())
            .get_result::<SubscriptionRow>(&mut conn)?;

        row.try_into()
    }

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = subscriptions::table
            .find(subscription_id)
            .select(SubscriptionRow::as_select())
            .first::<SubscriptionRow>(&mut conn)
            .optional()?;

        row.map(SubscriptionEntity::try_from).transpose()
    }

    async fn update_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(subscriptions::table.find(subscription_id))
            .set((
                subscriptions::status.eq(status.as_str()),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionRow::as_returning())
            .get_result::<SubscriptionRow>(&mut conn)
            .optional()?;

        row.map(SubscriptionEntity::try_from).transpose()
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscriptions::table
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .select(SubscriptionRow::as_select())
            .load::<SubscriptionRow>(&mut conn)?;

        rows.into_iter().map(SubscriptionEntity::try_from).collect()
    }
}
