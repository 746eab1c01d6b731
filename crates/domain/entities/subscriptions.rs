use anyhow::anyhow;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        billing_periods::{self, BillingPeriod},
        enums::{billing_cycles::BillingCycle, subscription_statuses::SubscriptionStatus},
    },
    infra::db::postgres::schema::subscriptions,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    /// Billing period containing `now`. Inside the stored `[start_date, end_date)` window that
    /// window is returned as is; later periods are rolled forward from `start_date`.
    pub fn current_period(&self, now: DateTime<Utc>) -> Option<BillingPeriod> {
        let initial = BillingPeriod {
            start: self.start_date,
            end: self.end_date,
        };
        if initial.contains(now) {
            return Some(initial);
        }
        billing_periods::current_period(self.start_date, self.billing_cycle, now)
    }
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub billing_cycle: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionEntity {
    type Error = anyhow::Error;

    fn try_from(value: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = SubscriptionStatus::from_str(&value.status).ok_or_else(|| {
            anyhow!("subscription {} has unknown status {:?}", value.id, value.status)
        })?;
        let billing_cycle = BillingCycle::from_str(&value.billing_cycle).ok_or_else(|| {
            anyhow!(
                "subscription {} has unknown billing cycle {:?}",
                value.id,
                value.billing_cycle
            )
        })?;

        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            team_id: value.team_id,
            plan_id: value.plan_id,
            start_date: value.start_date,
            end_date: value.end_date,
            status,
            billing_cycle,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub billing_cycle: String,
}
