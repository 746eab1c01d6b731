use anyhow::anyhow;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::billing_cycles::BillingCycle,
    infra::db::postgres::schema::plans,
};

/// Currency applied to plans created without an explicit one.
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row used for Diesel queries. The billing cycle stays as text and is parsed into BillingCycle.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_minor: i64,
    pub currency: String,
    pub billing_cycle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for PlanEntity {
    type Error = anyhow::Error;

    fn try_from(value: PlanRow) -> Result<Self, Self::Error> {
        let billing_cycle = BillingCycle::from_str(&value.billing_cycle).ok_or_else(|| {
            anyhow!(
                "plan {} has unknown billing cycle {:?}",
                value.id,
                value.billing_cycle
            )
        })?;

        Ok(Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            currency: value.currency,
            billing_cycle,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub price_minor: i64,
    pub currency: String,
    pub billing_cycle: String,
}

impl InsertPlanEntity {
    pub fn new(name: String, price_minor: i64, currency: String, billing_cycle: BillingCycle) -> Self {
        Self {
            name,
            price_minor,
            currency,
            billing_cycle: billing_cycle.to_string(),
        }
    }
}
