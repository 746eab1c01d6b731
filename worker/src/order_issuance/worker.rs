use anyhow::Result;
use std::{sync::Arc, time::Duration};
use subscription_billing::{
    application::usecases::order_issuance::OrderIssuanceUseCase,
    domain::repositories::{
        orders::OrderRepository, plans::PlanRepository,
        subscription_activations::SubscriptionActivationRepository,
        subscriptions::SubscriptionRepository,
    },
};
use tracing::{error, info, warn};

pub async fn run<P, S, O, A>(
    usecase: Arc<OrderIssuanceUseCase<P, S, O, A>>,
    interval: Duration,
) -> Result<()>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    A: SubscriptionActivationRepository + Send + Sync + 'static,
{
    info!(
        interval_secs = interval.as_secs(),
        "order_issuance: starting worker loop"
    );
    loop {
        run_pass(&usecase).await;
        tokio::time::sleep(interval).await;
    }
}

async fn run_pass<P, S, O, A>(usecase: &OrderIssuanceUseCase<P, S, O, A>)
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    A: SubscriptionActivationRepository + Send + Sync + 'static,
{
    match usecase.issue_orders().await {
        Ok(report) if report.failed > 0 => {
            warn!(
                issued = report.issued,
                failed = report.failed,
                failed_subscription_ids = ?report.failed_subscription_ids,
                "order_issuance: pass finished with failures"
            );
        }
        Ok(report) => {
            info!(
                issued = report.issued,
                issued_order_ids = ?report.issued_order_ids,
                "order_issuance: pass finished"
            );
        }
        Err(err) => {
            // Retried on the next tick.
            error!(
                code = err.code(),
                error = %err,
                "order_issuance: pass aborted"
            );
        }
    }
}
