use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, PlanRow},
    repositories::plans::PlanRepository,
};
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::plans};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = insert_into(plans::table)
            .values(&plan)
            .returning(PlanRow::as_returning())
            .get_result::<PlanRow>(&mut conn)?;

        row.try_into()
    }

    async fn update_plan(
        &self,
        plan_id: Uuid,
        name: String,
        price_minor: i64,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = update(plans::table.find(plan_id))
            .set((
                plans::name.eq(name),
                plans::price_minor.eq(price_minor),
                plans::updated_at.eq(Utc::now()),
            ))
            .returning(PlanRow::as_returning())
            .get_result::<PlanRow>(&mut conn)
            .optional()?;

        row.map(PlanEntity::try_from).transpose()
    }

    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = plans::table
            .filter(plans::id.eq(plan_id))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .optional()?;

        row.map(PlanEntity::try_from).transpose()
    }
}
