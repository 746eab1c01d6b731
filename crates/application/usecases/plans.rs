use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::errors::{BillingError, UseCaseResult};
use crate::domain::{
    entities::plans::{DEFAULT_CURRENCY, InsertPlanEntity, PlanEntity},
    repositories::plans::PlanRepository,
    value_objects::enums::billing_cycles::BillingCycle,
};

#[derive(Debug, Clone)]
pub struct CreatePlanParams {
    pub name: String,
    pub price_minor: i64,
    pub billing_cycle: String,
    /// Falls back to the catalog's default currency when absent.
    pub currency: Option<String>,
}

pub struct PlanCatalogUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    default_currency: String,
}

impl<P> PlanCatalogUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self::with_default_currency(plan_repo, DEFAULT_CURRENCY.to_string())
    }

    pub fn with_default_currency(plan_repo: Arc<P>, default_currency: String) -> Self {
        Self {
            plan_repo,
            default_currency,
        }
    }

    pub async fn create_plan(&self, params: CreatePlanParams) -> UseCaseResult<PlanEntity> {
        info!(
            name = %params.name,
            price_minor = params.price_minor,
            billing_cycle = %params.billing_cycle,
            "plans: create plan requested"
        );

        validate_price(params.price_minor)?;
        let billing_cycle = BillingCycle::from_str(&params.billing_cycle).ok_or_else(|| {
            let err = BillingError::Validation(format!(
                "unknown billing cycle {:?}; expected month or year",
                params.billing_cycle
            ));
            warn!(billing_cycle = %params.billing_cycle, "plans: rejected billing cycle");
            err
        })?;
        let currency = normalize_currency(params.currency.as_deref().unwrap_or(&self.default_currency))?;

        let plan = self
            .plan_repo
            .create_plan(InsertPlanEntity::new(
                params.name,
                params.price_minor,
                currency,
                billing_cycle,
            ))
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plans: failed to insert plan");
                BillingError::Persistence(err)
            })?;

        info!(plan_id = %plan.id, "plans: plan created");
        Ok(plan)
    }

    /// Renames and reprices a plan. Existing subscriptions keep their computed end dates.
    pub async fn update_plan(
        &self,
        plan_id: Uuid,
        new_name: String,
        new_price_minor: i64,
    ) -> UseCaseResult<PlanEntity> {
        validate_price(new_price_minor)?;

        let plan = self
            .plan_repo
            .update_plan(plan_id, new_name, new_price_minor)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to update plan");
                BillingError::Persistence(err)
            })?;

        match plan {
            Some(plan) => {
                info!(%plan_id, price_minor = plan.price_minor, "plans: plan updated");
                Ok(plan)
            }
            None => {
                warn!(%plan_id, "plans: update for unknown plan");
                Err(BillingError::NotFound(format!("plan {plan_id}")))
            }
        }
    }

    /// Absence is a normal outcome here, not an error.
    pub async fn read_plan(&self, plan_id: Uuid) -> UseCaseResult<Option<PlanEntity>> {
        self.plan_repo.find_by_id(plan_id).await.map_err(|err| {
            error!(%plan_id, db_error = ?err, "plans: failed to load plan");
            BillingError::Persistence(err)
        })
    }
}

fn validate_price(price_minor: i64) -> UseCaseResult<()> {
    if price_minor < 0 {
        return Err(BillingError::Validation(format!(
            "price must not be negative, got {price_minor}"
        )));
    }
    Ok(())
}

fn normalize_currency(value: &str) -> UseCaseResult<String> {
    let currency = value.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BillingError::Validation(format!(
            "currency must be a three letter code, got {value:?}"
        )));
    }
    Ok(currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::plans::MockPlanRepository;
    use anyhow::anyhow;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn sample_plan(id: Uuid, price_minor: i64) -> PlanEntity {
        let now = Utc::now();
        PlanEntity {
            id,
            name: "Basic".to_string(),
            price_minor,
            currency: "USD".to_string(),
            billing_cycle: BillingCycle::Month,
            created_at: now,
            updated_at: now,
        }
    }

    fn params(price_minor: i64, billing_cycle: &str) -> CreatePlanParams {
        CreatePlanParams {
            name: "Basic".to_string(),
            price_minor,
            billing_cycle: billing_cycle.to_string(),
            currency: None,
        }
    }

    #[tokio::test]
    async fn creates_plan_with_default_currency_and_canonical_cycle() {
        let mut plan_repo = MockPlanRepository::new();
        let plan_id = Uuid::new_v4();

        plan_repo
            .expect_create_plan()
            .with(eq(InsertPlanEntity::new(
                "Basic".to_string(),
                1_000,
                "USD".to_string(),
                BillingCycle::Month,
            )))
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(sample_plan(plan_id, 1_000)) }));

        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));
        let plan = usecase.create_plan(params(1_000, "monthly")).await.unwrap();

        assert_eq!(plan.id, plan_id);
    }

    #[tokio::test]
    async fn rejects_negative_price_without_touching_storage() {
        let plan_repo = MockPlanRepository::new();
        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));

        let err = usecase.create_plan(params(-1, "month")).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_billing_cycle() {
        let plan_repo = MockPlanRepository::new();
        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));

        let err = usecase.create_plan(params(1_000, "weekly")).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_currency() {
        let plan_repo = MockPlanRepository::new();
        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));

        let mut request = params(1_000, "year");
        request.currency = Some("US$".to_string());
        let err = usecase.create_plan(request).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn update_of_unknown_plan_is_not_found() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_update_plan()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));

        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));
        let err = usecase
            .update_plan(Uuid::new_v4(), "Premium".to_string(), 2_000)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_plan_returns_none_for_unknown_plan() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));
        assert!(usecase.read_plan(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_plan_surfaces_storage_failures() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Err(anyhow!("pool exhausted")) }));

        let usecase = PlanCatalogUseCase::new(Arc::new(plan_repo));
        let err = usecase.read_plan(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BillingError::Persistence(_)));
    }
}
