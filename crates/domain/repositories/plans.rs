use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity};

#[async_trait]
#[automock]
pub trait PlanRepository {
    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity>;

    /// Renames and reprices a plan. The billing cycle is never touched. `None` when the plan
    /// does not exist.
    async fn update_plan(
        &self,
        plan_id: Uuid,
        name: String,
        price_minor: i64,
    ) -> Result<Option<PlanEntity>>;

    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;
}
