use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub order_issuance: OrderIssuanceSchedule,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct OrderIssuanceSchedule {
    /// Pause between two issuance passes.
    pub interval: Duration,
}
