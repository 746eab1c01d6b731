use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::application::errors::{BillingError, UseCaseResult};
use crate::domain::{
    entities::{
        orders::OrderEntity,
        subscription_activations::{
            InsertSubscriptionActivationEntity, SubscriptionActivationEntity,
        },
    },
    repositories::{
        orders::OrderRepository, subscription_activations::SubscriptionActivationRepository,
    },
    value_objects::enums::order_statuses::OrderStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    Activated(SubscriptionActivationEntity),
    AlreadyActivated(SubscriptionActivationEntity),
    /// The order has not been paid yet; nothing was written.
    NotPaid,
}

pub struct ActivationUseCase<O, A>
where
    O: OrderRepository + Send + Sync + 'static,
    A: SubscriptionActivationRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    activation_repo: Arc<A>,
}

impl<O, A> ActivationUseCase<O, A>
where
    O: OrderRepository + Send + Sync + 'static,
    A: SubscriptionActivationRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>, activation_repo: Arc<A>) -> Self {
        Self {
            order_repo,
            activation_repo,
        }
    }

    pub async fn activate_on_payment(&self, order_id: Uuid) -> UseCaseResult<ActivationOutcome> {
        self.activate_on_payment_at(order_id, Utc::now()).await
    }

    /// Records that a paid order activated its subscription and moves the subscription back to
    /// active. Repeated calls for the same order never write a second activation.
    pub async fn activate_on_payment_at(
        &self,
        order_id: Uuid,
        now: DateTime<Utc>,
    ) -> UseCaseResult<ActivationOutcome> {
        let order = self.load_order(order_id).await?;

        if order.status != OrderStatus::Paid {
            debug!(%order_id, status = %order.status, "activations: order not paid yet");
            return Ok(ActivationOutcome::NotPaid);
        }

        if let Some(existing) = self.find_existing(order_id).await? {
            debug!(
                %order_id,
                activation_id = %existing.id,
                "activations: order already activated"
            );
            return Ok(ActivationOutcome::AlreadyActivated(existing));
        }

        let inserted = self
            .activation_repo
            .activate_subscription(InsertSubscriptionActivationEntity {
                order_id,
                subscription_id: order.subscription_id,
                activation_date: now,
            })
            .await
            .map_err(|err| {
                error!(
                    %order_id,
                    subscription_id = %order.subscription_id,
                    db_error = ?err,
                    "activations: failed to record activation"
                );
                BillingError::Persistence(err)
            })?;

        match inserted {
            Some(activation) => {
                info!(
                    %order_id,
                    subscription_id = %order.subscription_id,
                    activation_id = %activation.id,
                    "activations: subscription activated"
                );
                Ok(ActivationOutcome::Activated(activation))
            }
            // A concurrent call won between the lookup and the insert.
            None => self
                .find_existing(order_id)
                .await?
                .map(ActivationOutcome::AlreadyActivated)
                .ok_or_else(|| {
                    BillingError::Conflict(format!(
                        "activation for order {order_id} was rejected by storage"
                    ))
                }),
        }
    }

    /// The write a payment confirmation performs before activation. Idempotent for orders that
    /// are already paid.
    pub async fn record_payment(&self, order_id: Uuid) -> UseCaseResult<OrderEntity> {
        let order = self.load_order(order_id).await?;
        if order.status == OrderStatus::Paid {
            return Ok(order);
        }

        let order = self
            .order_repo
            .update_status(order_id, OrderStatus::Paid)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "activations: failed to mark order paid");
                BillingError::Persistence(err)
            })?
            .ok_or_else(|| BillingError::NotFound(format!("order {order_id}")))?;

        info!(%order_id, "activations: order marked paid");
        Ok(order)
    }

    pub async fn confirm_payment(&self, order_id: Uuid) -> UseCaseResult<ActivationOutcome> {
        self.record_payment(order_id).await?;
        self.activate_on_payment(order_id).await
    }

    pub async fn find_order(&self, order_id: Uuid) -> UseCaseResult<Option<OrderEntity>> {
        self.order_repo.find_by_id(order_id).await.map_err(|err| {
            error!(%order_id, db_error = ?err, "activations: failed to load order");
            BillingError::Persistence(err)
        })
    }

    pub async fn list_activations_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> UseCaseResult<Vec<SubscriptionActivationEntity>> {
        self.activation_repo
            .list_by_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "activations: failed to list activations");
                BillingError::Persistence(err)
            })
    }

    async fn load_order(&self, order_id: Uuid) -> UseCaseResult<OrderEntity> {
        self.find_order(order_id)
            .await?
            .ok_or_else(|| BillingError::NotFound(format!("order {order_id}")))
    }

    async fn find_existing(
        &self,
        order_id: Uuid,
    ) -> UseCaseResult<Option<SubscriptionActivationEntity>> {
        self.activation_repo
            .find_by_order_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "activations: failed to look up activation");
                BillingError::Persistence(err)
            })
    }
}
