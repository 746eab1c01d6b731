use anyhow::anyhow;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{billing_periods::BillingPeriod, enums::order_statuses::OrderStatus},
    infra::db::postgres::schema::orders,
};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderEntity {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod {
            start: self.period_start,
            end: self.period_end,
        }
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderEntity {
    type Error = anyhow::Error;

    fn try_from(value: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&value.status)
            .ok_or_else(|| anyhow!("order {} has unknown status {:?}", value.id, value.status))?;

        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            subscription_id: value.subscription_id,
            amount_minor: value.amount_minor,
            currency: value.currency,
            status,
            period_start: value.period_start,
            period_end: value.period_end,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = orders)]
pub struct InsertOrderEntity {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

impl InsertOrderEntity {
    /// A freshly issued order awaiting payment for `period`.
    pub fn pending(
        user_id: Uuid,
        subscription_id: Uuid,
        amount_minor: i64,
        currency: String,
        period: BillingPeriod,
    ) -> Self {
        Self {
            user_id,
            subscription_id,
            amount_minor,
            currency,
            status: OrderStatus::Pending.to_string(),
            period_start: period.start,
            period_end: period.end,
        }
    }

    pub fn period(&self) -> BillingPeriod {
        BillingPeriod {
            start: self.period_start,
            end: self.period_end,
        }
    }
}
