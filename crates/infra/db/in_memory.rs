//! In-memory implementation of every billing repository trait.
//!
//! All four tables live behind one mutex, so the two atomic write pairs (order + subscription
//! pending, activation + subscription active) are each a single critical section. Used by the
//! end-to-end tests and for running the engine without a database.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    entities::{
        orders::{InsertOrderEntity, OrderEntity},
        plans::{InsertPlanEntity, PlanEntity},
        subscription_activations::{
            InsertSubscriptionActivationEntity, SubscriptionActivationEntity,
        },
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    },
    repositories::{
        orders::OrderRepository, plans::PlanRepository,
        subscription_activations::SubscriptionActivationRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::enums::{
        billing_cycles::BillingCycle, order_statuses::OrderStatus,
        subscription_statuses::SubscriptionStatus,
    },
};

#[derive(Debug, Default)]
struct BillingTables {
    plans: HashMap<Uuid, PlanEntity>,
    subscriptions: HashMap<Uuid, SubscriptionEntity>,
    orders: HashMap<Uuid, OrderEntity>,
    activations: Vec<SubscriptionActivationEntity>,
}

impl BillingTables {
    fn activation_in_period(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Option<&SubscriptionActivationEntity> {
        self.activations
            .iter()
            .filter(|a| a.subscription_id == subscription_id)
            .filter(|a| a.activation_date >= period_start && a.activation_date < period_end)
            .min_by_key(|a| a.activation_date)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    tables: Mutex<BillingTables>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, BillingTables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("in-memory billing store lock poisoned"))
    }
}

fn parse_cycle(value: &str) -> Result<BillingCycle> {
    BillingCycle::from_str(value).ok_or_else(|| anyhow!("unknown billing cycle {value:?}"))
}

fn parse_subscription_status(value: &str) -> Result<SubscriptionStatus> {
    SubscriptionStatus::from_str(value)
        .ok_or_else(|| anyhow!("unknown subscription status {value:?}"))
}

fn parse_order_status(value: &str) -> Result<OrderStatus> {
    OrderStatus::from_str(value).ok_or_else(|| anyhow!("unknown order status {value:?}"))
}

#[async_trait]
impl PlanRepository for InMemoryBillingStore {
    async fn create_plan(&self, plan: InsertPlanEntity) -> Result<PlanEntity> {
        let billing_cycle = parse_cycle(&plan.billing_cycle)?;
        let now = Utc::now();
        let entity = PlanEntity {
            id: Uuid::new_v4(),
            name: plan.name,
            price_minor: plan.price_minor,
            currency: plan.currency,
            billing_cycle,
            created_at: now,
            updated_at: now,
        };

        self.tables()?.plans.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn update_plan(
        &self,
        plan_id: Uuid,
        name: String,
        price_minor: i64,
    ) -> Result<Option<PlanEntity>> {
        let mut tables = self.tables()?;
        let Some(plan) = tables.plans.get_mut(&plan_id) else {
            return Ok(None);
        };

        plan.name = name;
        plan.price_minor = price_minor;
        plan.updated_at = Utc::now();
        Ok(Some(plan.clone()))
    }

    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        Ok(self.tables()?.plans.get(&plan_id).cloned())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn create_subscription(
        &self,
        subscription: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let status = parse_subscription_status(&subscription.status)?;
        let billing_cycle = parse_cycle(&subscription.billing_cycle)?;

        let mut tables = self.tables()?;
        if !tables.plans.contains_key(&subscription.plan_id) {
            return Err(anyhow!(
                "subscription references missing plan {}",
                subscription.plan_id
            ));
        }

        let now = Utc::now();
        let entity = SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: subscription.user_id,
            team_id: subscription.team_id,
            plan_id: subscription.plan_id,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            status,
            billing_cycle,
            created_at: now,
            updated_at: now,
        };

        tables.subscriptions.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, subscription_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        Ok(self.tables()?.subscriptions.get(&subscription_id).cloned())
    }

    async fn update_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut tables = self.tables()?;
        let Some(subscription) = tables.subscriptions.get_mut(&subscription_id) else {
            return Ok(None);
        };

        subscription.status = status;
        subscription.updated_at = Utc::now();
        Ok(Some(subscription.clone()))
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<SubscriptionEntity>> {
        Ok(self
            .tables()?
            .subscriptions
            .values()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryBillingStore {
    async fn issue_pending_order(&self, order: InsertOrderEntity) -> Result<Option<OrderEntity>> {
        let status = parse_order_status(&order.status)?;
        let mut tables = self.tables()?;

        let is_active = tables
            .subscriptions
            .get(&order.subscription_id)
            .is_some_and(|s| s.status == SubscriptionStatus::Active);
        if !is_active {
            return Ok(None);
        }

        if tables
            .activation_in_period(order.subscription_id, order.period_start, order.period_end)
            .is_some()
        {
            return Ok(None);
        }

        let period_taken = tables.orders.values().any(|o| {
            o.subscription_id == order.subscription_id && o.period_start == order.period_start
        });
        if period_taken {
            return Ok(None);
        }

        let now = Utc::now();
        let entity = OrderEntity {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            subscription_id: order.subscription_id,
            amount_minor: order.amount_minor,
            currency: order.currency,
            status,
            period_start: order.period_start,
            period_end: order.period_end,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(entity.id, entity.clone());

        if let Some(subscription) = tables.subscriptions.get_mut(&order.subscription_id) {
            subscription.status = SubscriptionStatus::Pending;
            subscription.updated_at = now;
        }

        Ok(Some(entity))
    }

    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderEntity>> {
        Ok(self.tables()?.orders.get(&order_id).cloned())
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderEntity>> {
        let mut tables = self.tables()?;
        let Some(order) = tables.orders.get_mut(&order_id) else {
            return Ok(None);
        };

        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn list_by_subscription(&self, subscription_id: Uuid) -> Result<Vec<OrderEntity>> {
        let mut orders: Vec<OrderEntity> = self
            .tables()?
            .orders
            .values()
            .filter(|o| o.subscription_id == subscription_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.period_start);
        Ok(orders)
    }
}

#[async_trait]
impl SubscriptionActivationRepository for InMemoryBillingStore {
    async fn find_in_period(
        &self,
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Option<SubscriptionActivationEntity>> {
        Ok(self
            .tables()?
            .activation_in_period(subscription_id, period_start, period_end)
            .cloned())
    }

    async fn find_by_order_id(&self, order_id: Uuid) -> Result<Option<SubscriptionActivationEntity>> {
        Ok(self
            .tables()?
            .activations
            .iter()
            .find(|a| a.order_id == order_id)
            .cloned())
    }

    async fn activate_subscription(
        &self,
        activation: InsertSubscriptionActivationEntity,
    ) -> Result<Option<SubscriptionActivationEntity>> {
        let mut tables = self.tables()?;

        if tables.activations.iter().any(|a| a.order_id == activation.order_id) {
            return Ok(None);
        }
        if !tables.orders.contains_key(&activation.order_id) {
            return Err(anyhow!(
                "activation references missing order {}",
                activation.order_id
            ));
        }

        let Some(subscription) = tables.subscriptions.get_mut(&activation.subscription_id) else {
            return Err(anyhow!(
                "activation references missing subscription {}",
                activation.subscription_id
            ));
        };
        let now = Utc::now();
        subscription.status = SubscriptionStatus::Active;
        subscription.updated_at = now;

        let entity = SubscriptionActivationEntity {
            id: Uuid::new_v4(),
            order_id: activation.order_id,
            subscription_id: activation.subscription_id,
            activation_date: activation.activation_date,
            created_at: now,
            updated_at: now,
        };
        tables.activations.push(entity.clone());

        Ok(Some(entity))
    }

    async fn list_by_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Vec<SubscriptionActivationEntity>> {
        let mut activations: Vec<SubscriptionActivationEntity> = self
            .tables()?
            .activations
            .iter()
            .filter(|a| a.subscription_id == subscription_id)
            .cloned()
            .collect();
        activations.sort_by_key(|a| a.activation_date);
        Ok(activations)
    }
}
