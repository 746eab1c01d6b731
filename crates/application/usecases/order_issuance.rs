use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::errors::{BillingError, UseCaseResult};
use crate::domain::{
    entities::{
        orders::{InsertOrderEntity, OrderEntity},
        subscription_activations::SubscriptionActivationEntity,
        subscriptions::SubscriptionEntity,
    },
    repositories::{
        orders::OrderRepository, plans::PlanRepository,
        subscription_activations::SubscriptionActivationRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        billing_periods::BillingPeriod, enums::subscription_statuses::SubscriptionStatus,
    },
};

/// What a pass should do with one subscription, decided without touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceDecision {
    Issue { period: BillingPeriod },
    AlreadyBilled { period: BillingPeriod },
    NotStarted,
}

/// `activation_in_period` is whatever the ledger returned for the subscription's current period.
pub fn decide_issuance(
    subscription: &SubscriptionEntity,
    now: DateTime<Utc>,
    activation_in_period: Option<&SubscriptionActivationEntity>,
) -> IssuanceDecision {
    let Some(period) = subscription.current_period(now) else {
        return IssuanceDecision::NotStarted;
    };

    match activation_in_period {
        Some(activation)
            if activation.subscription_id == subscription.id
                && period.contains(activation.activation_date) =>
        {
            IssuanceDecision::AlreadyBilled { period }
        }
        _ => IssuanceDecision::Issue { period },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssuanceOutcome {
    Issued(OrderEntity),
    AlreadyBilled { period: BillingPeriod },
    NotStarted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuanceReport {
    pub scanned: usize,
    pub issued: usize,
    pub already_billed: usize,
    pub not_started: usize,
    pub conflicts: usize,
    pub failed: usize,
    pub issued_order_ids: Vec<Uuid>,
    pub failed_subscription_ids: Vec<Uuid>,
}

pub struct OrderIssuanceUseCase<P, S, O, A>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    A: SubscriptionActivationRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    order_repo: Arc<O>,
    activation_repo: Arc<A>,
}

impl<P, S, O, A> OrderIssuanceUseCase<P, S, O, A>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    A: SubscriptionActivationRepository + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        subscription_repo: Arc<S>,
        order_repo: Arc<O>,
        activation_repo: Arc<A>,
    ) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            order_repo,
            activation_repo,
        }
    }

    pub async fn issue_orders(&self) -> UseCaseResult<IssuanceReport> {
        self.issue_orders_at(Utc::now()).await
    }

    /// One pass over every active subscription. Per-subscription failures are logged and
    /// counted; only a failure to list the subscriptions aborts the pass.
    pub async fn issue_orders_at(&self, now: DateTime<Utc>) -> UseCaseResult<IssuanceReport> {
        let subscriptions = self
            .subscription_repo
            .list_active_subscriptions()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "order_issuance: failed to list active subscriptions");
                BillingError::Persistence(err)
            })?;

        let mut report = IssuanceReport {
            scanned: subscriptions.len(),
            ..Default::default()
        };

        for subscription in &subscriptions {
            match self.issue_for_subscription(subscription, now).await {
                Ok(IssuanceOutcome::Issued(order)) => {
                    info!(
                        order_id = %order.id,
                        subscription_id = %subscription.id,
                        amount_minor = order.amount_minor,
                        currency = %order.currency,
                        period_start = %order.period_start,
                        period_end = %order.period_end,
                        "order_issuance: order issued"
                    );
                    report.issued += 1;
                    report.issued_order_ids.push(order.id);
                }
                Ok(IssuanceOutcome::AlreadyBilled { period }) => {
                    debug!(
                        subscription_id = %subscription.id,
                        period_start = %period.start,
                        "order_issuance: period already billed"
                    );
                    report.already_billed += 1;
                }
                Ok(IssuanceOutcome::NotStarted) => {
                    debug!(
                        subscription_id = %subscription.id,
                        start_date = %subscription.start_date,
                        "order_issuance: subscription has not started"
                    );
                    report.not_started += 1;
                }
                Err(BillingError::Conflict(reason)) => {
                    warn!(
                        subscription_id = %subscription.id,
                        %reason,
                        "order_issuance: lost issuance race; skipping"
                    );
                    report.conflicts += 1;
                }
                Err(err) => {
                    error!(
                        subscription_id = %subscription.id,
                        error = %err,
                        code = err.code(),
                        "order_issuance: failed to issue order; continuing"
                    );
                    report.failed += 1;
                    report.failed_subscription_ids.push(subscription.id);
                }
            }
        }

        info!(
            scanned = report.scanned,
            issued = report.issued,
            already_billed = report.already_billed,
            not_started = report.not_started,
            conflicts = report.conflicts,
            failed = report.failed,
            "order_issuance: completed"
        );

        Ok(report)
    }

    pub async fn issue_order(&self, subscription_id: Uuid) -> UseCaseResult<OrderEntity> {
        self.issue_order_at(subscription_id, Utc::now()).await
    }

    /// Manual issuance for a single subscription, through the same guarded path as the pass.
    pub async fn issue_order_at(
        &self,
        subscription_id: Uuid,
        now: DateTime<Utc>,
    ) -> UseCaseResult<OrderEntity> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    db_error = ?err,
                    "order_issuance: failed to load subscription"
                );
                BillingError::Persistence(err)
            })?
            .ok_or_else(|| BillingError::NotFound(format!("subscription {subscription_id}")))?;

        if subscription.status != SubscriptionStatus::Active {
            return Err(BillingError::Conflict(format!(
                "subscription {subscription_id} is already awaiting payment"
            )));
        }

        match self.issue_for_subscription(&subscription, now).await? {
            IssuanceOutcome::Issued(order) => {
                info!(
                    order_id = %order.id,
                    %subscription_id,
                    amount_minor = order.amount_minor,
                    "order_issuance: order issued manually"
                );
                Ok(order)
            }
            IssuanceOutcome::AlreadyBilled { period } => Err(BillingError::Conflict(format!(
                "subscription {subscription_id} is already billed for the period starting {}",
                period.start
            ))),
            IssuanceOutcome::NotStarted => Err(BillingError::Validation(format!(
                "subscription {subscription_id} starts at {}",
                subscription.start_date
            ))),
        }
    }

    pub async fn list_orders_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> UseCaseResult<Vec<OrderEntity>> {
        self.order_repo
            .list_by_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "order_issuance: failed to list orders");
                BillingError::Persistence(err)
            })
    }

    async fn issue_for_subscription(
        &self,
        subscription: &SubscriptionEntity,
        now: DateTime<Utc>,
    ) -> UseCaseResult<IssuanceOutcome> {
        let Some(period) = subscription.current_period(now) else {
            return Ok(IssuanceOutcome::NotStarted);
        };

        let activation = self
            .activation_repo
            .find_in_period(subscription.id, period.start, period.end)
            .await
            .map_err(BillingError::Persistence)?;

        let period = match decide_issuance(subscription, now, activation.as_ref()) {
            IssuanceDecision::Issue { period } => period,
            IssuanceDecision::AlreadyBilled { period } => {
                return Ok(IssuanceOutcome::AlreadyBilled { period });
            }
            IssuanceDecision::NotStarted => return Ok(IssuanceOutcome::NotStarted),
        };

        let plan = self
            .plan_repo
            .find_by_id(subscription.plan_id)
            .await
            .map_err(BillingError::Persistence)?
            .ok_or_else(|| BillingError::NotFound(format!("plan {}", subscription.plan_id)))?;

        let order = self
            .order_repo
            .issue_pending_order(InsertOrderEntity::pending(
                subscription.user_id,
                subscription.id,
                plan.price_minor,
                plan.currency,
                period,
            ))
            .await
            .map_err(BillingError::Persistence)?
            .ok_or_else(|| {
                BillingError::Conflict(format!(
                    "subscription {} already has an order or activation for the period starting {}",
                    subscription.id, period.start
                ))
            })?;

        Ok(IssuanceOutcome::Issued(order))
    }
}
