use super::config_model::{Database, DotEnvyConfig, OrderIssuanceSchedule};
use anyhow::{Context, Result, bail};
use std::time::Duration;

const DEFAULT_INTERVAL_SECS: u64 = 86_400;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
        max_connections: parse_max_connections(std::env::var("DATABASE_MAX_CONNECTIONS").ok())?,
    };

    let order_issuance = OrderIssuanceSchedule {
        interval: parse_interval(std::env::var("ORDER_ISSUANCE_INTERVAL_SECS").ok())?,
    };

    Ok(DotEnvyConfig {
        database,
        order_issuance,
    })
}

fn parse_interval(raw: Option<String>) -> Result<Duration> {
    let secs = match raw.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_INTERVAL_SECS,
        Some(value) => value
            .parse::<u64>()
            .context("ORDER_ISSUANCE_INTERVAL_SECS is invalid")?,
    };
    if secs == 0 {
        bail!("ORDER_ISSUANCE_INTERVAL_SECS must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_max_connections(raw: Option<String>) -> Result<u32> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => {
            let size = value
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS is invalid")?;
            if size == 0 {
                bail!("DATABASE_MAX_CONNECTIONS must be greater than zero");
            }
            Ok(size)
        }
    }
}
