use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::application::errors::{BillingError, UseCaseResult};
use crate::domain::{
    entities::plans::PlanEntity, repositories::plans::PlanRepository,
    value_objects::upgrade_price::upgrade_price,
};

pub struct UpgradePriceUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> UpgradePriceUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    /// Price difference owed when switching plans, never negative. No proration.
    pub async fn calculate_upgrade_price(
        &self,
        current_plan_id: Uuid,
        new_plan_id: Uuid,
    ) -> UseCaseResult<i64> {
        let current_plan = self.load_plan(current_plan_id).await?;
        let new_plan = self.load_plan(new_plan_id).await?;

        let price = upgrade_price(current_plan.price_minor, new_plan.price_minor);
        info!(
            %current_plan_id,
            %new_plan_id,
            upgrade_price_minor = price,
            "plans: upgrade price calculated"
        );
        Ok(price)
    }

    async fn load_plan(&self, plan_id: Uuid) -> UseCaseResult<PlanEntity> {
        self.plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan for upgrade");
                BillingError::Persistence(err)
            })?
            .ok_or_else(|| BillingError::Validation(format!("invalid plan id {plan_id}")))
    }
}
