use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::application::{
    errors::BillingError,
    usecases::{
        activations::{ActivationOutcome, ActivationUseCase},
        order_issuance::OrderIssuanceUseCase,
        plans::{CreatePlanParams, PlanCatalogUseCase},
        subscriptions::{CreateSubscriptionParams, SubscriptionUseCase},
        upgrade_price::UpgradePriceUseCase,
    },
};
use crate::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    value_objects::{
        billing_periods::BillingPeriod,
        enums::{
            billing_cycles::BillingCycle, order_statuses::OrderStatus,
            subscription_statuses::SubscriptionStatus,
        },
    },
};
use crate::infra::db::in_memory::InMemoryBillingStore;

type Store = InMemoryBillingStore;

struct Engine {
    plans: PlanCatalogUseCase<Store>,
    subscriptions: SubscriptionUseCase<Store, Store>,
    issuance: OrderIssuanceUseCase<Store, Store, Store, Store>,
    activations: ActivationUseCase<Store, Store>,
    upgrades: UpgradePriceUseCase<Store>,
}

impl Engine {
    fn new() -> Self {
        let store = Arc::new(InMemoryBillingStore::new());
        Self {
            plans: PlanCatalogUseCase::new(Arc::clone(&store)),
            subscriptions: SubscriptionUseCase::new(Arc::clone(&store), Arc::clone(&store)),
            issuance: OrderIssuanceUseCase::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::clone(&store),
            ),
            activations: ActivationUseCase::new(Arc::clone(&store), Arc::clone(&store)),
            upgrades: UpgradePriceUseCase::new(store),
        }
    }

    async fn plan(&self, name: &str, price_minor: i64, billing_cycle: &str) -> PlanEntity {
        self.plans
            .create_plan(CreatePlanParams {
                name: name.to_string(),
                price_minor,
                billing_cycle: billing_cycle.to_string(),
                currency: None,
            })
            .await
            .unwrap()
    }

    async fn subscribe(&self, plan: &PlanEntity, start_date: DateTime<Utc>) -> SubscriptionEntity {
        self.subscriptions
            .create_subscription(CreateSubscriptionParams {
                user_id: Uuid::new_v4(),
                team_id: Uuid::new_v4(),
                plan_id: plan.id,
                start_date,
                billing_cycle: plan.billing_cycle.to_string(),
            })
            .await
            .unwrap()
    }

    async fn status_of(&self, subscription_id: Uuid) -> SubscriptionStatus {
        self.subscriptions
            .read_subscription(subscription_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn created_plan_reads_back_unchanged() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "month").await;

    let fetched = engine.plans.read_plan(plan.id).await.unwrap().unwrap();
    assert_eq!(fetched, plan);
    assert_eq!(fetched.name, "Basic");
    assert_eq!(fetched.price_minor, 1_000);
    assert_eq!(fetched.billing_cycle, BillingCycle::Month);
    assert_eq!(fetched.currency, "USD");
}

#[tokio::test]
async fn plan_update_keeps_cycle_and_existing_end_dates() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "month").await;
    let subscription = engine.subscribe(&plan, at(2024, 1, 1)).await;

    let updated = engine
        .plans
        .update_plan(plan.id, "Premium".to_string(), 2_000)
        .await
        .unwrap();
    assert_eq!(updated.name, "Premium");
    assert_eq!(updated.price_minor, 2_000);
    assert_eq!(updated.billing_cycle, BillingCycle::Month);

    let reloaded = engine
        .subscriptions
        .read_subscription(subscription.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.end_date, at(2024, 2, 1));
}

#[tokio::test]
async fn monthly_billing_scenario() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 10, "month").await;

    let subscription = engine.subscribe(&plan, at(2024, 1, 1)).await;
    assert_eq!(subscription.end_date, at(2024, 2, 1));
    assert_eq!(subscription.status, SubscriptionStatus::Active);

    let report = engine.issuance.issue_orders_at(at(2024, 1, 15)).await.unwrap();
    assert_eq!(report.issued, 1);

    let orders = engine
        .issuance
        .list_orders_for_subscription(subscription.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.amount_minor, 10);
    assert_eq!(order.currency, "USD");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(engine.status_of(subscription.id).await, SubscriptionStatus::Pending);

    let not_paid = engine
        .activations
        .activate_on_payment_at(order.id, at(2024, 1, 16))
        .await
        .unwrap();
    assert_eq!(not_paid, ActivationOutcome::NotPaid);

    engine.activations.record_payment(order.id).await.unwrap();
    let outcome = engine
        .activations
        .activate_on_payment_at(order.id, at(2024, 1, 16))
        .await
        .unwrap();
    assert!(matches!(outcome, ActivationOutcome::Activated(_)));
    assert_eq!(engine.status_of(subscription.id).await, SubscriptionStatus::Active);

    let activations = engine
        .activations
        .list_activations_for_subscription(subscription.id)
        .await
        .unwrap();
    assert_eq!(activations.len(), 1);
    let january = BillingPeriod {
        start: at(2024, 1, 1),
        end: at(2024, 2, 1),
    };
    assert!(january.contains(activations[0].activation_date));

    let rerun = engine.issuance.issue_orders_at(at(2024, 1, 20)).await.unwrap();
    assert_eq!(rerun.issued, 0);
    assert_eq!(rerun.already_billed, 1);
    assert_eq!(
        engine
            .issuance
            .list_orders_for_subscription(subscription.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn repeated_passes_in_one_period_issue_a_single_order() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "month").await;
    let first = engine.subscribe(&plan, at(2024, 1, 1)).await;
    let second = engine.subscribe(&plan, at(2024, 1, 10)).await;

    let report = engine.issuance.issue_orders_at(at(2024, 1, 15)).await.unwrap();
    assert_eq!(report.issued, 2);

    let rerun = engine.issuance.issue_orders_at(at(2024, 1, 15)).await.unwrap();
    assert_eq!(rerun.scanned, 0);
    assert_eq!(rerun.issued, 0);

    for subscription in [first.id, second.id] {
        let orders = engine
            .issuance
            .list_orders_for_subscription(subscription)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(engine.status_of(subscription).await, SubscriptionStatus::Pending);
    }
}

#[tokio::test]
async fn forced_reactivation_cannot_bill_the_same_period_twice() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "month").await;
    let subscription = engine.subscribe(&plan, at(2024, 1, 1)).await;

    engine.issuance.issue_orders_at(at(2024, 1, 15)).await.unwrap();
    engine
        .subscriptions
        .update_status(subscription.id, SubscriptionStatus::Active)
        .await
        .unwrap();

    let report = engine.issuance.issue_orders_at(at(2024, 1, 16)).await.unwrap();
    assert_eq!(report.issued, 0);
    assert_eq!(report.conflicts, 1);

    let err = engine
        .issuance
        .issue_order_at(subscription.id, at(2024, 1, 16))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::Conflict(_)));
}

#[tokio::test]
async fn next_period_is_billed_after_rollover() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "month").await;
    let subscription = engine.subscribe(&plan, at(2024, 1, 1)).await;

    engine.issuance.issue_orders_at(at(2024, 1, 15)).await.unwrap();
    let january = engine
        .issuance
        .list_orders_for_subscription(subscription.id)
        .await
        .unwrap()
        .remove(0);
    engine.activations.record_payment(january.id).await.unwrap();
    engine
        .activations
        .activate_on_payment_at(january.id, at(2024, 1, 16))
        .await
        .unwrap();

    let report = engine.issuance.issue_orders_at(at(2024, 2, 3)).await.unwrap();
    assert_eq!(report.issued, 1);

    let orders = engine
        .issuance
        .list_orders_for_subscription(subscription.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].period_start, at(2024, 2, 1));
    assert_eq!(orders[1].period_end, at(2024, 3, 1));
}

#[tokio::test]
async fn activating_twice_writes_one_record() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "year").await;
    let subscription = engine.subscribe(&plan, at(2024, 1, 1)).await;
    assert_eq!(subscription.end_date, at(2025, 1, 1));

    let order = engine
        .issuance
        .issue_order_at(subscription.id, at(2024, 3, 1))
        .await
        .unwrap();

    let first = engine.activations.confirm_payment(order.id).await.unwrap();
    let second = engine.activations.confirm_payment(order.id).await.unwrap();

    let ActivationOutcome::Activated(activation) = first else {
        panic!("expected first confirmation to activate, got {first:?}");
    };
    assert_eq!(second, ActivationOutcome::AlreadyActivated(activation));
    assert_eq!(
        engine
            .activations
            .list_activations_for_subscription(subscription.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn subscriptions_not_yet_started_are_left_alone() {
    let engine = Engine::new();
    let plan = engine.plan("Basic", 1_000, "month").await;
    let subscription = engine.subscribe(&plan, at(2024, 6, 1)).await;

    let report = engine.issuance.issue_orders_at(at(2024, 5, 1)).await.unwrap();
    assert_eq!(report.not_started, 1);
    assert_eq!(report.issued, 0);
    assert_eq!(engine.status_of(subscription.id).await, SubscriptionStatus::Active);
}

#[tokio::test]
async fn upgrade_price_uses_catalog_prices() {
    let engine = Engine::new();
    let basic = engine.plan("Basic", 1_000, "month").await;
    let premium = engine.plan("Premium", 2_500, "month").await;

    assert_eq!(
        engine
            .upgrades
            .calculate_upgrade_price(basic.id, premium.id)
            .await
            .unwrap(),
        1_500
    );
    assert_eq!(
        engine
            .upgrades
            .calculate_upgrade_price(premium.id, basic.id)
            .await
            .unwrap(),
        0
    );
}
