use anyhow::Result;
use std::sync::Arc;
use subscription_billing::{
    application::usecases::order_issuance::OrderIssuanceUseCase,
    infra::db::{
        postgres::postgres_connection,
        repositories::{
            orders::OrderPostgres, plans::PlanPostgres,
            subscription_activations::SubscriptionActivationPostgres,
            subscriptions::SubscriptionPostgres,
        },
    },
};
use tracing::{error, info};
use worker::{config, order_issuance};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    subscription_billing::observability::init_observability("worker")?;

    let dotenvy_env = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let issuance_usecase = Arc::new(OrderIssuanceUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool_arc))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool_arc))),
        Arc::new(OrderPostgres::new(Arc::clone(&db_pool_arc))),
        Arc::new(SubscriptionActivationPostgres::new(Arc::clone(&db_pool_arc))),
    ));

    let issuance_loop = tokio::spawn(order_issuance::worker::run(
        issuance_usecase,
        dotenvy_env.order_issuance.interval,
    ));

    tokio::select! {
        result = issuance_loop => result??,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received; stopping worker");
        }
    };

    Ok(())
}
