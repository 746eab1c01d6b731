use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::errors::{BillingError, UseCaseResult};
use crate::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        billing_periods::compute_end_date,
        enums::{billing_cycles::BillingCycle, subscription_statuses::SubscriptionStatus},
    },
};

#[derive(Debug, Clone)]
pub struct CreateSubscriptionParams {
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub billing_cycle: String,
}

pub struct SubscriptionUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> SubscriptionUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
        }
    }

    /// Starts an active subscription whose first period is `[start_date, end_date)`.
    ///
    /// The subscription's own billing cycle wins over the plan's; a mismatch is only logged.
    pub async fn create_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> UseCaseResult<SubscriptionEntity> {
        info!(
            user_id = %params.user_id,
            team_id = %params.team_id,
            plan_id = %params.plan_id,
            billing_cycle = %params.billing_cycle,
            "subscriptions: create subscription requested"
        );

        let plan = self
            .plan_repo
            .find_by_id(params.plan_id)
            .await
            .map_err(|err| {
                error!(
                    plan_id = %params.plan_id,
                    db_error = ?err,
                    "subscriptions: failed to load plan"
                );
                BillingError::Persistence(err)
            })?
            .ok_or_else(|| {
                warn!(plan_id = %params.plan_id, "subscriptions: unknown plan");
                BillingError::Validation(format!("invalid plan id {}", params.plan_id))
            })?;

        let billing_cycle = BillingCycle::from_str(&params.billing_cycle).ok_or_else(|| {
            BillingError::Validation(format!(
                "unknown billing cycle {:?}; expected month or year",
                params.billing_cycle
            ))
        })?;

        if billing_cycle != plan.billing_cycle {
            debug!(
                plan_id = %plan.id,
                plan_cycle = %plan.billing_cycle,
                subscription_cycle = %billing_cycle,
                "subscriptions: subscription cycle differs from plan cycle"
            );
        }

        let end_date = compute_end_date(params.start_date, billing_cycle);
        let subscription = self
            .subscription_repo
            .create_subscription(InsertSubscriptionEntity {
                user_id: params.user_id,
                team_id: params.team_id,
                plan_id: plan.id,
                start_date: params.start_date,
                end_date,
                status: SubscriptionStatus::Active.to_string(),
                billing_cycle: billing_cycle.to_string(),
            })
            .await
            .map_err(|err| {
                error!(
                    user_id = %params.user_id,
                    plan_id = %params.plan_id,
                    db_error = ?err,
                    "subscriptions: failed to insert subscription"
                );
                BillingError::Persistence(err)
            })?;

        info!(
            subscription_id = %subscription.id,
            end_date = %subscription.end_date,
            "subscriptions: subscription created"
        );
        Ok(subscription)
    }

    pub async fn update_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> UseCaseResult<SubscriptionEntity> {
        let subscription = self
            .subscription_repo
            .update_status(subscription_id, status)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    status = %status,
                    db_error = ?err,
                    "subscriptions: failed to update status"
                );
                BillingError::Persistence(err)
            })?;

        subscription.ok_or_else(|| BillingError::NotFound(format!("subscription {subscription_id}")))
    }

    pub async fn list_active(&self) -> UseCaseResult<Vec<SubscriptionEntity>> {
        self.subscription_repo
            .list_active_subscriptions()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "subscriptions: failed to list active subscriptions");
                BillingError::Persistence(err)
            })
    }

    /// Looks the subscription up by its primary key. Absence is not an error.
    pub async fn read_subscription(
        &self,
        subscription_id: Uuid,
    ) -> UseCaseResult<Option<SubscriptionEntity>> {
        self.subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "subscriptions: failed to load subscription");
                BillingError::Persistence(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::plans::PlanEntity,
        repositories::{plans::MockPlanRepository, subscriptions::MockSubscriptionRepository},
    };
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn sample_plan(id: Uuid, billing_cycle: BillingCycle) -> PlanEntity {
        PlanEntity {
            id,
            name: "Basic".to_string(),
            price_minor: 1_000,
            currency: "USD".to_string(),
            billing_cycle,
            created_at: at(2023, 12, 1),
            updated_at: at(2023, 12, 1),
        }
    }

    fn stored(insert: InsertSubscriptionEntity) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: insert.user_id,
            team_id: insert.team_id,
            plan_id: insert.plan_id,
            start_date: insert.start_date,
            end_date: insert.end_date,
            status: SubscriptionStatus::from_str(&insert.status).unwrap(),
            billing_cycle: BillingCycle::from_str(&insert.billing_cycle).unwrap(),
            created_at: insert.start_date,
            updated_at: insert.start_date,
        }
    }

    fn params(plan_id: Uuid, billing_cycle: &str) -> CreateSubscriptionParams {
        CreateSubscriptionParams {
            user_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            plan_id,
            start_date: at(2024, 1, 1),
            billing_cycle: billing_cycle.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_active_subscription_with_computed_end_date() {
        let plan_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .returning(move |_| Box::pin(async move { Ok(Some(sample_plan(plan_id, BillingCycle::Month))) }));

        subscription_repo
            .expect_create_subscription()
            .withf(|insert| {
                insert.end_date == at(2024, 2, 1)
                    && insert.status == "active"
                    && insert.billing_cycle == "month"
            })
            .times(1)
            .returning(|insert| Box::pin(async move { Ok(stored(insert)) }));

        let usecase = SubscriptionUseCase::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let subscription = usecase
            .create_subscription(params(plan_id, "month"))
            .await
            .unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.end_date, at(2024, 2, 1));
    }

    #[tokio::test]
    async fn subscription_cycle_overrides_plan_cycle() {
        let plan_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        plan_repo
            .expect_find_by_id()
            .returning(move |_| Box::pin(async move { Ok(Some(sample_plan(plan_id, BillingCycle::Month))) }));
        subscription_repo
            .expect_create_subscription()
            .returning(|insert| Box::pin(async move { Ok(stored(insert)) }));

        let usecase = SubscriptionUseCase::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let subscription = usecase
            .create_subscription(params(plan_id, "yearly"))
            .await
            .unwrap();

        assert_eq!(subscription.billing_cycle, BillingCycle::Year);
        assert_eq!(subscription.end_date, at(2025, 1, 1));
    }

    #[tokio::test]
    async fn unknown_plan_is_a_validation_error() {
        let mut plan_repo = MockPlanRepository::new();
        let subscription_repo = MockSubscriptionRepository::new();

        plan_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionUseCase::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let err = usecase
            .create_subscription(params(Uuid::new_v4(), "month"))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_cycle_is_a_validation_error() {
        let plan_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let subscription_repo = MockSubscriptionRepository::new();

        plan_repo
            .expect_find_by_id()
            .returning(move |_| Box::pin(async move { Ok(Some(sample_plan(plan_id, BillingCycle::Month))) }));

        let usecase = SubscriptionUseCase::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let err = usecase
            .create_subscription(params(plan_id, "fortnight"))
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn update_status_of_missing_subscription_is_not_found() {
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let subscription_id = Uuid::new_v4();

        subscription_repo
            .expect_update_status()
            .with(eq(subscription_id), eq(SubscriptionStatus::Pending))
            .returning(|_, _| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionUseCase::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        let err = usecase
            .update_status(subscription_id, SubscriptionStatus::Pending)
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_subscription_looks_up_by_primary_key() {
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let subscription_id = Uuid::new_v4();

        subscription_repo
            .expect_find_by_id()
            .with(eq(subscription_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionUseCase::new(Arc::new(plan_repo), Arc::new(subscription_repo));
        assert!(usecase.read_subscription(subscription_id).await.unwrap().is_none());
    }
}
